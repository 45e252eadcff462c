//! Top-k ranking of class probabilities

use crate::catalog::InfoCatalog;
use crate::labels::LabelResolver;
use agrisens_core::ClassLabel;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One entry of a ranked prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub label: String,
    pub probability: f64,
    pub info: String,
}

/// Descending by probability; NaN sorts last
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Indices of the `k` largest probabilities, highest first.
///
/// Ties keep their original order.
pub fn top_k_indices(probabilities: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..probabilities.len()).collect();
    indices.sort_by(|&a, &b| descending(probabilities[a], probabilities[b]));
    indices.truncate(k);
    indices
}

/// Rank the `k` most probable classes.
///
/// `probabilities` is aligned with `class_order`; if the two disagree in
/// length only the common prefix is ranked. Each class is resolved with
/// `resolver` and described from `catalog`.
pub fn rank_top_k(
    probabilities: &[f64],
    class_order: &[ClassLabel],
    k: usize,
    resolver: &LabelResolver,
    catalog: &InfoCatalog,
) -> Vec<RankedEntry> {
    let n = probabilities.len().min(class_order.len());
    if n != probabilities.len() || n != class_order.len() {
        tracing::warn!(
            probabilities = probabilities.len(),
            classes = class_order.len(),
            "Probability vector and class order differ in length"
        );
    }

    top_k_indices(&probabilities[..n], k)
        .into_iter()
        .map(|i| {
            let label = resolver.resolve(&class_order[i]);
            let info = catalog.lookup(&label).to_string();
            RankedEntry {
                label,
                probability: probabilities[i],
                info,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InfoCatalog {
        InfoCatalog::from_json(r#"{"rice": "Paddy.", "maize": "Corn.", "jute": "Fibre."}"#).unwrap()
    }

    fn names(labels: &[&str]) -> Vec<ClassLabel> {
        labels.iter().map(|l| ClassLabel::from(*l)).collect()
    }

    #[test]
    fn test_rank_top_two() {
        let resolver = LabelResolver::alphabetical(["rice", "maize", "jute"]);
        let ranked = rank_top_k(
            &[0.1, 0.7, 0.2],
            &names(&["rice", "maize", "jute"]),
            2,
            &resolver,
            &catalog(),
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].label, "maize");
        assert_eq!(ranked[0].probability, 0.7);
        assert_eq!(ranked[0].info, "Corn.");
        assert_eq!(ranked[1].label, "jute");
        assert_eq!(ranked[1].probability, 0.2);
    }

    #[test]
    fn test_k_larger_than_classes() {
        let resolver = LabelResolver::alphabetical(["rice", "maize"]);
        let ranked = rank_top_k(
            &[0.4, 0.6],
            &names(&["rice", "maize"]),
            5,
            &resolver,
            &catalog(),
        );
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_ties_keep_class_order() {
        assert_eq!(top_k_indices(&[0.25, 0.5, 0.25, 0.0], 4), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_nan_sorts_last() {
        assert_eq!(top_k_indices(&[f64::NAN, 0.1, 0.9], 3), vec![2, 1, 0]);
    }

    #[test]
    fn test_encoded_class_order_is_resolved() {
        let resolver = LabelResolver::alphabetical(["rice", "maize", "jute"]);
        let classes = vec![ClassLabel::Index(0), ClassLabel::Index(1), ClassLabel::Index(2)];
        let ranked = rank_top_k(&[0.2, 0.3, 0.5], &classes, 3, &resolver, &catalog());

        // Alphabetical: 0 = jute, 1 = maize, 2 = rice
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["rice", "maize", "jute"]);
        assert_eq!(ranked[0].info, "Paddy.");
    }

    #[test]
    fn test_unknown_class_gets_sentinel_info() {
        let resolver = LabelResolver::alphabetical(Vec::<String>::new());
        let ranked = rank_top_k(&[1.0], &[ClassLabel::Index(9)], 1, &resolver, &catalog());
        assert_eq!(ranked[0].label, "9");
        assert_eq!(ranked[0].info, crate::catalog::NO_CROP_INFO);
    }

    #[test]
    fn test_length_mismatch_uses_common_prefix() {
        let resolver = LabelResolver::alphabetical(["rice"]);
        let ranked = rank_top_k(&[0.3, 0.7], &names(&["rice"]), 3, &resolver, &catalog());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].label, "rice");
    }

    #[test]
    fn test_zero_k_is_empty() {
        let resolver = LabelResolver::alphabetical(["rice"]);
        assert!(rank_top_k(&[1.0], &names(&["rice"]), 0, &resolver, &catalog()).is_empty());
    }
}
