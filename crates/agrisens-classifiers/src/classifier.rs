//! Classifier capability traits

use agrisens_core::{ClassLabel, Result};
use std::sync::Arc;

/// Trait for all trained classifiers
pub trait Classifier: Send + Sync {
    /// Predict the class of a single feature row
    fn predict(&self, features: &[f64]) -> Result<ClassLabel>;

    /// Number of input features the model was fitted on
    fn n_features(&self) -> usize;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Probability capability, if the model has one.
    ///
    /// Models that cannot produce a distribution, or that lack a class
    /// ordering to align it with, return `None`.
    fn probabilistic(self: Arc<Self>) -> Option<Arc<dyn ProbabilisticClassifier>> {
        None
    }
}

/// Classifiers that expose a per-class probability distribution
pub trait ProbabilisticClassifier: Send + Sync {
    /// Probabilities for a single feature row, aligned with [`Self::class_order`]
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;

    /// The model's internal class ordering
    fn class_order(&self) -> &[ClassLabel];
}

/// Inverse label lookup, typically backed by a fitted label encoder
pub trait LabelDecoder: Send + Sync {
    /// Decode an encoded class index. Returns `None` when the index is unknown.
    fn try_decode(&self, index: i64) -> Option<String>;
}

/// A classifier together with its capabilities, detected once at load time
#[derive(Clone)]
pub struct ClassifierHandle {
    classifier: Arc<dyn Classifier>,
    probabilistic: Option<Arc<dyn ProbabilisticClassifier>>,
}

impl ClassifierHandle {
    /// Wrap a classifier, querying its probability capability
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        let probabilistic = Arc::clone(&classifier).probabilistic();
        Self {
            classifier,
            probabilistic,
        }
    }

    /// The underlying classifier
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// The probability capability, if present
    pub fn probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        self.probabilistic.as_deref()
    }

    /// Whether top-k ranking is available for this model
    pub fn supports_ranking(&self) -> bool {
        self.probabilistic.is_some()
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("name", &self.classifier.name())
            .field("n_features", &self.classifier.n_features())
            .field("supports_ranking", &self.supports_ranking())
            .finish()
    }
}
