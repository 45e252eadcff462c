//! Property tests for label resolution and ranking

use agrisens_classifiers::ranking::top_k_indices;
use agrisens_classifiers::{
    AlphabeticalMapping, InfoCatalog, LabelDecoder, LabelEncoder, LabelResolver, LabelSource,
    rank_top_k,
};
use agrisens_core::ClassLabel;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

fn class_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,10}", 0..25)
}

fn raw_label() -> impl Strategy<Value = ClassLabel> {
    prop_oneof![
        any::<i64>().prop_map(ClassLabel::Index),
        (-5i64..40).prop_map(ClassLabel::Index),
        "[A-Za-z ]{0,12}".prop_map(ClassLabel::Name),
        any::<f64>().prop_map(|f| ClassLabel::from_value(&json!(f))),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(|f| json!(f)),
        "[a-z]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::Array)
    })
}

proptest! {
    /// The fallback mapping is sorted and free of duplicates
    #[test]
    fn prop_fallback_sorted_unique(names in class_names()) {
        let mapping = AlphabeticalMapping::new(names.clone());
        let classes = mapping.classes();
        prop_assert!(classes.windows(2).all(|w| w[0] < w[1]));
        for name in &names {
            prop_assert!(classes.contains(name));
        }
    }

    /// Without a decoder, in-range indices map to the sorted class names
    #[test]
    fn prop_index_uses_sorted_names(names in class_names(), index in 0i64..30) {
        let resolver = LabelResolver::alphabetical(names.clone());
        let mut sorted = names;
        sorted.sort();
        sorted.dedup();

        let resolution = resolver.resolve_with_source(&ClassLabel::Index(index));
        match sorted.get(index as usize) {
            Some(expected) => {
                prop_assert_eq!(&resolution.label, expected);
                prop_assert_eq!(resolution.source, LabelSource::Alphabetical);
            }
            None => {
                prop_assert_eq!(resolution.label, index.to_string());
                prop_assert_eq!(resolution.source, LabelSource::Stringified);
            }
        }
    }

    /// A decoder always wins over the fallback for indices it knows
    #[test]
    fn prop_decoder_has_priority(names in prop::collection::vec("[a-z]{1,10}", 1..10), index in 0usize..10) {
        let encoder = LabelEncoder::new(names.clone());
        let decoder: Arc<dyn LabelDecoder> = Arc::new(encoder);
        let resolver = LabelResolver::new(Some(decoder), AlphabeticalMapping::new(["zzz"]));

        let label = resolver.resolve(&ClassLabel::Index(index as i64));
        match names.get(index) {
            Some(expected) => prop_assert_eq!(&label, expected),
            None => prop_assert!(label == "zzz" || label == index.to_string()),
        }
    }

    /// Resolving an already resolved label changes nothing
    #[test]
    fn prop_resolution_idempotent(names in class_names(), raw in raw_label()) {
        let resolver = LabelResolver::alphabetical(names);
        let once = resolver.resolve(&raw);
        let twice = resolver.resolve(&ClassLabel::Name(once.clone()));
        prop_assert_eq!(once, twice);
    }

    /// Arbitrary JSON output never breaks resolution
    #[test]
    fn prop_any_value_resolves(names in class_names(), value in json_value()) {
        let resolver = LabelResolver::alphabetical(names);
        let first = resolver.resolve_value(&value);
        prop_assert_eq!(first, resolver.resolve_value(&value));
    }

    /// Top-k is a descending prefix of the ranking
    #[test]
    fn prop_top_k_descending(probs in prop::collection::vec(0.0f64..1.0, 0..30), k in 0usize..10) {
        let indices = top_k_indices(&probs, k);
        prop_assert_eq!(indices.len(), k.min(probs.len()));
        prop_assert!(indices.windows(2).all(|w| probs[w[0]] >= probs[w[1]]));

        let mut unique = indices.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), indices.len());

        if let Some(&lowest) = indices.last() {
            let excluded = (0..probs.len()).filter(|i| !indices.contains(i));
            for i in excluded {
                prop_assert!(probs[i] <= probs[lowest]);
            }
        }
    }

    /// Every ranked label comes from the class order
    #[test]
    fn prop_ranked_labels_from_classes(probs in prop::collection::vec(0.0f64..1.0, 1..10)) {
        let classes: Vec<ClassLabel> = (0..probs.len())
            .map(|i| ClassLabel::Name(format!("crop{i}")))
            .collect();
        let resolver = LabelResolver::alphabetical(Vec::<String>::new());
        let ranked = rank_top_k(&probs, &classes, 3, &resolver, &InfoCatalog::default());

        for entry in &ranked {
            let index: usize = entry.label.trim_start_matches("crop").parse().unwrap();
            prop_assert_eq!(entry.probability, probs[index]);
        }
    }
}
