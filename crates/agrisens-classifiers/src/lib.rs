//! AgriSens Classifiers
//!
//! Crop and fertilizer recommendation on top of exported random forests.
//!
//! Models are loaded once at startup into a [`PredictionContext`], which
//! detects whether the model exposes class probabilities and binds it to a
//! [`LabelResolver`]. Integer predictions are decoded by a fitted label
//! encoder when one is available and otherwise by an alphabetical mapping
//! of the known class names.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod context;
pub mod crop;
pub mod encoder;
pub mod fertilizer;
pub mod forest;
pub mod labels;
pub mod ranking;
pub mod registry;

pub use catalog::{FertilizerCatalog, FertilizerInfo, InfoCatalog, NO_CROP_INFO};
pub use classifier::{Classifier, ClassifierHandle, LabelDecoder, ProbabilisticClassifier};
pub use config::{ArtifactConfig, CropArtifacts, FertilizerArtifacts};
pub use context::PredictionContext;
pub use crop::{CropRecommendation, CropRecommender};
pub use encoder::{LabelEncoder, StandardScaler};
pub use fertilizer::{
    validate_inputs, FertilizerInput, FertilizerRecommendation, FertilizerRecommender,
    ModelMetrics,
};
pub use forest::RandomForest;
pub use labels::{resolve_label, AlphabeticalMapping, LabelResolver, LabelSource, Resolution};
pub use ranking::{rank_top_k, RankedEntry};
pub use registry::{load_config, RecommenderRegistry};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Classifier, LabelDecoder, ProbabilisticClassifier};
    pub use crate::crop::CropRecommender;
    pub use crate::fertilizer::FertilizerRecommender;
    pub use crate::labels::LabelResolver;
    pub use crate::registry::RecommenderRegistry;
}
