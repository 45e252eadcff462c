//! Crop recommendation

use crate::catalog::InfoCatalog;
use crate::classifier::{Classifier, LabelDecoder};
use crate::config::{ArtifactConfig, CropArtifacts};
use crate::context::PredictionContext;
use crate::encoder::LabelEncoder;
use crate::forest::RandomForest;
use crate::labels::{AlphabeticalMapping, LabelResolver, LabelSource};
use crate::ranking::RankedEntry;
use agrisens_core::{Error, Result, SoilReading};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A crop recommendation as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRecommendation {
    /// Recommended crop
    pub prediction: String,

    /// Description of the recommended crop
    pub info: String,

    /// Most probable crops, when the model exposes probabilities
    #[serde(rename = "top_3", skip_serializing_if = "Option::is_none")]
    pub ranked: Option<Vec<RankedEntry>>,

    /// Which rule resolved the predicted label
    #[serde(skip)]
    pub label_source: LabelSource,
}

/// Crop model with its label resolution and description catalog
#[derive(Debug, Clone)]
pub struct CropRecommender {
    context: PredictionContext,
    catalog: Arc<InfoCatalog>,
    top_k: usize,
}

impl CropRecommender {
    /// Assemble a recommender. Without explicit `fallback_classes` the
    /// alphabetical fallback is built from the catalog's class names.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        decoder: Option<Arc<dyn LabelDecoder>>,
        catalog: InfoCatalog,
        fallback_classes: Option<Vec<String>>,
        top_k: usize,
    ) -> Self {
        let fallback = match fallback_classes {
            Some(classes) => AlphabeticalMapping::new(classes),
            None => AlphabeticalMapping::new(catalog.class_names()),
        };
        Self {
            context: PredictionContext::new(classifier, LabelResolver::new(decoder, fallback)),
            catalog: Arc::new(catalog),
            top_k,
        }
    }

    /// Load all crop artifacts named in the configuration
    pub fn from_config(config: &ArtifactConfig) -> Result<Self> {
        let crop: &CropArtifacts = &config.crop;

        let model_path = config.resolve(&crop.model);
        let model = RandomForest::from_file(&model_path).map_err(|e| {
            Error::model(format!("failed to load crop model {}: {e}", model_path.display()))
        })?;
        info!(
            path = %model_path.display(),
            trees = model.n_trees(),
            classes = model.n_classes(),
            "Loaded crop model"
        );

        let info_path = config.resolve(&crop.info);
        let catalog = InfoCatalog::from_file(&info_path).map_err(|e| {
            Error::config(format!("failed to load crop info {}: {e}", info_path.display()))
        })?;
        info!(path = %info_path.display(), entries = catalog.len(), "Loaded crop info");

        let decoder = crop
            .label_encoder
            .as_ref()
            .and_then(|path| load_optional_encoder(&config.resolve(path)));

        Ok(Self::new(
            Arc::new(model),
            decoder,
            catalog,
            crop.fallback_classes.clone(),
            crop.top_k,
        ))
    }

    /// Recommend a crop for a soil reading
    pub fn recommend(&self, reading: &SoilReading) -> Result<CropRecommendation> {
        self.recommend_row(&reading.to_row())
    }

    /// Recommend a crop for a raw feature row
    pub fn recommend_row(&self, features: &[f64]) -> Result<CropRecommendation> {
        let resolution = self.context.predict_label(features)?;
        if resolution.source.is_fallback() {
            debug!(
                label = %resolution.label,
                source = %resolution.source,
                "Label resolved by fallback"
            );
        }

        let ranked = self
            .context
            .rank(features, self.top_k, &self.catalog)?
            .filter(|entries| !entries.is_empty());

        Ok(CropRecommendation {
            info: self.catalog.lookup(&resolution.label).to_string(),
            prediction: resolution.label,
            ranked,
            label_source: resolution.source,
        })
    }

    /// Top-k ranking alone; `None` when the model has no probabilities
    pub fn top_k_predictions(
        &self,
        features: &[f64],
        k: usize,
    ) -> Result<Option<Vec<RankedEntry>>> {
        self.context.rank(features, k, &self.catalog)
    }

    pub fn context(&self) -> &PredictionContext {
        &self.context
    }

    pub fn catalog(&self) -> &InfoCatalog {
        &self.catalog
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// The crop encoder is best-effort: a missing or corrupt file only degrades
/// label quality.
fn load_optional_encoder(path: &std::path::Path) -> Option<Arc<dyn LabelDecoder>> {
    if !path.exists() {
        warn!(path = %path.display(), "Label encoder not found, using alphabetical fallback");
        return None;
    }
    match LabelEncoder::from_file(path) {
        Ok(encoder) => {
            info!(
                path = %path.display(),
                classes = encoder.classes().len(),
                "Loaded label encoder"
            );
            Some(Arc::new(encoder))
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Label encoder unreadable, using alphabetical fallback"
            );
            None
        }
    }
}
