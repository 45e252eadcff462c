//! Label resolution: turning raw classifier output into class names
//!
//! Integer predictions are decoded in priority order:
//! 1. the configured [`LabelDecoder`] (a fitted label encoder), if any
//! 2. the alphabetical fallback mapping over the known class names
//! 3. the integer itself, stringified
//!
//! Resolution never fails. A missing or broken encoder degrades the output
//! to a less polished label instead of failing the request.

use crate::classifier::LabelDecoder;
use agrisens_core::ClassLabel;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Index -> class name mapping built by sorting the known class names.
///
/// This assumes the model was trained on alphabetically encoded targets,
/// which is what a label encoder produces, but nothing verifies it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlphabeticalMapping {
    classes: Vec<String>,
}

impl AlphabeticalMapping {
    /// Build the mapping from an unordered set of class names
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Class name for an encoded index
    pub fn get(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    /// Sorted class names
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Which rule produced a resolved label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelSource {
    /// Decoded by the label decoder
    Decoder,
    /// Decoded by the alphabetical fallback
    Alphabetical,
    /// Already a class name
    Verbatim,
    /// Nothing could decode it; the raw value was stringified
    Stringified,
}

impl LabelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decoder => "decoder",
            Self::Alphabetical => "alphabetical",
            Self::Verbatim => "verbatim",
            Self::Stringified => "stringified",
        }
    }

    /// True when a degraded fallback produced the label
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Alphabetical | Self::Stringified)
    }
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved label and the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub label: String,
    pub source: LabelSource,
}

/// Resolve a raw label to a class name. Never fails.
pub fn resolve_label(
    raw: &ClassLabel,
    decoder: Option<&dyn LabelDecoder>,
    fallback: &AlphabeticalMapping,
) -> String {
    resolve_with_source(raw, decoder, fallback).label
}

/// Like [`resolve_label`], also reporting which rule applied
pub fn resolve_with_source(
    raw: &ClassLabel,
    decoder: Option<&dyn LabelDecoder>,
    fallback: &AlphabeticalMapping,
) -> Resolution {
    match raw {
        ClassLabel::Index(index) => {
            if let Some(label) = decoder.and_then(|d| d.try_decode(*index)) {
                return Resolution {
                    label,
                    source: LabelSource::Decoder,
                };
            }
            if let Some(label) = fallback.get(*index) {
                return Resolution {
                    label: label.to_string(),
                    source: LabelSource::Alphabetical,
                };
            }
            Resolution {
                label: index.to_string(),
                source: LabelSource::Stringified,
            }
        }
        ClassLabel::Name(name) => Resolution {
            label: name.clone(),
            source: LabelSource::Verbatim,
        },
        ClassLabel::Opaque(raw) => Resolution {
            label: raw.clone(),
            source: LabelSource::Stringified,
        },
    }
}

/// Label resolution with its decoder and fallback bound together
#[derive(Clone)]
pub struct LabelResolver {
    decoder: Option<Arc<dyn LabelDecoder>>,
    fallback: AlphabeticalMapping,
}

impl LabelResolver {
    pub fn new(decoder: Option<Arc<dyn LabelDecoder>>, fallback: AlphabeticalMapping) -> Self {
        Self { decoder, fallback }
    }

    /// Resolver with no decoder, relying on the alphabetical fallback only
    pub fn alphabetical<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(None, AlphabeticalMapping::new(classes))
    }

    pub fn resolve(&self, raw: &ClassLabel) -> String {
        self.resolve_with_source(raw).label
    }

    pub fn resolve_with_source(&self, raw: &ClassLabel) -> Resolution {
        resolve_with_source(raw, self.decoder.as_deref(), &self.fallback)
    }

    /// Resolve a raw JSON value, unwrapping a length-1 array first
    pub fn resolve_value(&self, raw: &Value) -> String {
        self.resolve(&ClassLabel::from_value(raw))
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn fallback(&self) -> &AlphabeticalMapping {
        &self.fallback
    }
}

impl fmt::Debug for LabelResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelResolver")
            .field("has_decoder", &self.has_decoder())
            .field("fallback", &self.fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::LabelEncoder;
    use serde_json::json;

    /// Decoder that knows nothing
    struct BrokenDecoder;

    impl LabelDecoder for BrokenDecoder {
        fn try_decode(&self, _index: i64) -> Option<String> {
            None
        }
    }

    fn crops() -> AlphabeticalMapping {
        AlphabeticalMapping::new(["wheat", "banana", "rice"])
    }

    #[test]
    fn test_alphabetical_mapping_is_sorted() {
        let mapping = crops();
        assert_eq!(mapping.classes(), ["banana", "rice", "wheat"]);
        assert_eq!(mapping.get(0), Some("banana"));
        assert_eq!(mapping.get(2), Some("wheat"));
        assert_eq!(mapping.get(3), None);
        assert_eq!(mapping.get(-1), None);
    }

    #[test]
    fn test_alphabetical_mapping_dedups() {
        let mapping = AlphabeticalMapping::new(["rice", "rice", "maize"]);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_decoder_takes_priority() {
        let encoder = LabelEncoder::new(vec!["zucchini".to_string()]);
        let resolution = resolve_with_source(&ClassLabel::Index(0), Some(&encoder), &crops());
        assert_eq!(resolution.label, "zucchini");
        assert_eq!(resolution.source, LabelSource::Decoder);
    }

    #[test]
    fn test_failing_decoder_falls_back() {
        let resolution =
            resolve_with_source(&ClassLabel::Index(1), Some(&BrokenDecoder), &crops());
        assert_eq!(resolution.label, "rice");
        assert_eq!(resolution.source, LabelSource::Alphabetical);
    }

    #[test]
    fn test_decoder_miss_falls_back() {
        let encoder = LabelEncoder::new(vec!["zucchini".to_string()]);
        assert_eq!(
            resolve_label(&ClassLabel::Index(2), Some(&encoder), &crops()),
            "wheat"
        );
    }

    #[test]
    fn test_out_of_range_is_stringified() {
        let resolution = resolve_with_source(&ClassLabel::Index(42), None, &crops());
        assert_eq!(resolution.label, "42");
        assert_eq!(resolution.source, LabelSource::Stringified);
        assert_eq!(resolve_label(&ClassLabel::Index(-7), None, &crops()), "-7");
    }

    #[test]
    fn test_names_pass_through() {
        let resolution = resolve_with_source(&ClassLabel::from("Rice"), None, &crops());
        assert_eq!(resolution.label, "Rice");
        assert_eq!(resolution.source, LabelSource::Verbatim);
    }

    #[test]
    fn test_resolver_unwraps_values() {
        let resolver = LabelResolver::alphabetical(["wheat", "banana", "rice"]);
        assert_eq!(resolver.resolve_value(&json!([0])), "banana");
        assert_eq!(resolver.resolve_value(&json!("maize")), "maize");
        assert_eq!(resolver.resolve_value(&json!(2.5)), "2.5");
        assert_eq!(resolver.resolve_value(&json!({"a": 1})), r#"{"a":1}"#);
        assert!(!resolver.has_decoder());
    }

    #[test]
    fn test_fallback_flags() {
        assert!(LabelSource::Alphabetical.is_fallback());
        assert!(LabelSource::Stringified.is_fallback());
        assert!(!LabelSource::Decoder.is_fallback());
        assert!(!LabelSource::Verbatim.is_fallback());
    }
}
