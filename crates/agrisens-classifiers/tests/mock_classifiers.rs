//! Mock classifiers for testing
//!
//! Provides configurable implementations of the Classifier trait for
//! testing capability detection, label resolution and error handling
//! without a trained model.

use agrisens_classifiers::{
    AlphabeticalMapping, Classifier, CropRecommender, InfoCatalog, LabelDecoder, LabelResolver,
    LabelSource, PredictionContext, ProbabilisticClassifier,
};
use agrisens_core::{ClassLabel, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A classifier returning a fixed prediction and, optionally, a fixed
/// probability distribution
pub struct MockClassifier {
    name: String,
    prediction: ClassLabel,
    probabilities: Option<(Vec<f64>, Vec<ClassLabel>)>,
    call_count: AtomicU32,
}

impl MockClassifier {
    pub fn new(name: &str, prediction: impl Into<ClassLabel>) -> Self {
        Self {
            name: name.to_string(),
            prediction: prediction.into(),
            probabilities: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Expose a probability capability with this distribution and class order
    pub fn with_probabilities(mut self, probabilities: Vec<f64>, classes: Vec<ClassLabel>) -> Self {
        self.probabilities = Some((probabilities, classes));
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Classifier for MockClassifier {
    fn predict(&self, _features: &[f64]) -> Result<ClassLabel> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.prediction.clone())
    }

    fn n_features(&self) -> usize {
        7
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn probabilistic(self: Arc<Self>) -> Option<Arc<dyn ProbabilisticClassifier>> {
        if self.probabilities.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl ProbabilisticClassifier for MockClassifier {
    fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>> {
        Ok(self
            .probabilities
            .as_ref()
            .map(|(p, _)| p.clone())
            .unwrap_or_default())
    }

    fn class_order(&self) -> &[ClassLabel] {
        self.probabilities
            .as_ref()
            .map(|(_, c)| c.as_slice())
            .unwrap_or(&[])
    }
}

/// A classifier that always fails
pub struct FailingClassifier {
    name: String,
    error_message: String,
}

impl FailingClassifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error_message: "model failure".to_string(),
        }
    }

    /// Set a custom error message
    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }
}

impl Classifier for FailingClassifier {
    fn predict(&self, _features: &[f64]) -> Result<ClassLabel> {
        Err(agrisens_core::Error::prediction(&self.error_message))
    }

    fn n_features(&self) -> usize {
        7
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A decoder that knows nothing
struct EmptyDecoder;

impl LabelDecoder for EmptyDecoder {
    fn try_decode(&self, _index: i64) -> Option<String> {
        None
    }
}

fn catalog() -> InfoCatalog {
    InfoCatalog::new(HashMap::from([
        ("apple".to_string(), "Temperate fruit.".to_string()),
        ("banana".to_string(), "Tropical.".to_string()),
        ("rice".to_string(), "Paddy.".to_string()),
    ]))
}

const ROW: [f64; 7] = [90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9];

#[test]
fn test_capability_detected_once() {
    let plain = PredictionContext::new(
        Arc::new(MockClassifier::new("plain", "rice")),
        LabelResolver::alphabetical(["rice"]),
    );
    assert!(!plain.supports_ranking());
    assert!(plain.rank(&ROW, 3, &catalog()).unwrap().is_none());
    assert!(plain.max_probability(&ROW).unwrap().is_none());

    let ranked = PredictionContext::new(
        Arc::new(
            MockClassifier::new("ranked", "rice")
                .with_probabilities(vec![0.8, 0.2], vec!["rice".into(), "apple".into()]),
        ),
        LabelResolver::alphabetical(["rice", "apple"]),
    );
    assert!(ranked.supports_ranking());
    assert_eq!(ranked.max_probability(&ROW).unwrap(), Some(0.8));
}

#[test]
fn test_prediction_without_probabilities_has_no_ranking() {
    let recommender = CropRecommender::new(
        Arc::new(MockClassifier::new("plain", 1i64)),
        None,
        catalog(),
        None,
        3,
    );

    let result = recommender.recommend_row(&ROW).unwrap();
    assert_eq!(result.prediction, "banana");
    assert_eq!(result.info, "Tropical.");
    assert!(result.ranked.is_none());
}

#[test]
fn test_string_prediction_passes_through() {
    let recommender = CropRecommender::new(
        Arc::new(MockClassifier::new("named", "rice")),
        Some(Arc::new(EmptyDecoder)),
        catalog(),
        None,
        3,
    );

    let result = recommender.recommend_row(&ROW).unwrap();
    assert_eq!(result.prediction, "rice");
    assert_eq!(result.label_source, LabelSource::Verbatim);
    assert_eq!(result.info, "Paddy.");
}

#[test]
fn test_unknown_index_is_stringified() {
    let recommender = CropRecommender::new(
        Arc::new(MockClassifier::new("wide", 42i64)),
        Some(Arc::new(EmptyDecoder)),
        catalog(),
        None,
        3,
    );

    let result = recommender.recommend_row(&ROW).unwrap();
    assert_eq!(result.prediction, "42");
    assert_eq!(result.label_source, LabelSource::Stringified);
    assert_eq!(result.info, "No information available for this crop.");
}

#[test]
fn test_encoded_class_order_is_ranked_and_resolved() {
    let classifier = MockClassifier::new("encoded", 2i64).with_probabilities(
        vec![0.1, 0.3, 0.6],
        vec![ClassLabel::Index(0), ClassLabel::Index(1), ClassLabel::Index(2)],
    );
    let recommender = CropRecommender::new(Arc::new(classifier), None, catalog(), None, 3);

    let result = recommender.recommend_row(&ROW).unwrap();
    assert_eq!(result.prediction, "rice");

    let labels: Vec<String> = result.ranked.unwrap().into_iter().map(|e| e.label).collect();
    assert_eq!(labels, vec!["rice", "banana", "apple"]);
}

#[test]
fn test_empty_ranking_is_omitted() {
    let classifier = MockClassifier::new("empty", "rice").with_probabilities(vec![], vec![]);
    let recommender = CropRecommender::new(Arc::new(classifier), None, catalog(), None, 3);

    let result = recommender.recommend_row(&ROW).unwrap();
    assert!(result.ranked.is_none());
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("top_3").is_none());
}

#[test]
fn test_failing_classifier_propagates() {
    let recommender = CropRecommender::new(
        Arc::new(FailingClassifier::new("broken").with_error("tree exploded")),
        None,
        catalog(),
        None,
        3,
    );

    let err = recommender.recommend_row(&ROW).unwrap_err();
    assert!(err.to_string().contains("tree exploded"));
}

#[test]
fn test_mock_call_count() {
    let classifier = Arc::new(MockClassifier::new("counted", "rice"));
    let context = PredictionContext::new(
        classifier.clone(),
        LabelResolver::new(None, AlphabeticalMapping::default()),
    );

    context.predict_label(&ROW).unwrap();
    context.predict_label(&ROW).unwrap();
    assert_eq!(classifier.call_count(), 2);
}
