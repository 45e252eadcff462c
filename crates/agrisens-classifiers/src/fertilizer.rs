//! Fertilizer recommendation
//!
//! The fertilizer model consumes weather and soil readings plus the soil
//! and crop type, both label-encoded with their own fitted encoders:
//! `[temperature, humidity, moisture, soil, crop, nitrogen, potassium, phosphorous]`.

use crate::catalog::{FertilizerCatalog, FertilizerInfo};
use crate::classifier::{Classifier, LabelDecoder};
use crate::config::{ArtifactConfig, FertilizerArtifacts};
use crate::context::PredictionContext;
use crate::encoder::{LabelEncoder, StandardScaler};
use crate::forest::RandomForest;
use crate::labels::{AlphabeticalMapping, LabelResolver, LabelSource};
use agrisens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Readings and categorical inputs for one fertilizer prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerInput {
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
    pub soil_type: String,
    pub crop_type: String,
    pub nitrogen: f64,
    pub potassium: f64,
    pub phosphorous: f64,
}

/// Check readings against their plausible ranges, collecting every violation
pub fn validate_inputs(input: &FertilizerInput) -> Vec<String> {
    let checks = [
        (input.temperature, 0.0, 60.0, "Temperature should be between 0°C and 60°C"),
        (input.humidity, 0.0, 100.0, "Humidity should be between 0% and 100%"),
        (input.moisture, 0.0, 100.0, "Soil moisture should be between 0% and 100%"),
        (input.nitrogen, 0.0, 300.0, "Nitrogen should be between 0 and 300 mg/kg"),
        (input.potassium, 0.0, 300.0, "Potassium should be between 0 and 300 mg/kg"),
        (input.phosphorous, 0.0, 300.0, "Phosphorous should be between 0 and 300 mg/kg"),
    ];

    checks
        .into_iter()
        // NaN fails the range check too
        .filter(|(value, min, max, _)| !(*min..=*max).contains(value))
        .map(|(_, _, _, message)| message.to_string())
        .collect()
}

/// Held-out evaluation results shipped with the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub cv_mean: f64,
    pub cv_std: f64,
}

/// A fertilizer recommendation as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerRecommendation {
    pub fertilizer: String,

    /// Probability of the top class, in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    pub info: FertilizerInfo,

    #[serde(skip)]
    pub label_source: LabelSource,
}

/// Fertilizer model with its encoders and catalog
#[derive(Debug, Clone)]
pub struct FertilizerRecommender {
    context: PredictionContext,
    soil_encoder: LabelEncoder,
    crop_encoder: LabelEncoder,
    scaler: Option<StandardScaler>,
    metrics: Option<ModelMetrics>,
    catalog: FertilizerCatalog,
}

impl FertilizerRecommender {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        fertilizer_encoder: LabelEncoder,
        soil_encoder: LabelEncoder,
        crop_encoder: LabelEncoder,
        catalog: FertilizerCatalog,
    ) -> Self {
        let fallback = AlphabeticalMapping::new(catalog.names());
        let decoder: Arc<dyn LabelDecoder> = Arc::new(fertilizer_encoder);
        Self {
            context: PredictionContext::new(
                classifier,
                LabelResolver::new(Some(decoder), fallback),
            ),
            soil_encoder,
            crop_encoder,
            scaler: None,
            metrics: None,
            catalog,
        }
    }

    /// Apply a fitted feature scaler before prediction
    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    /// Attach evaluation metrics for display
    pub fn with_metrics(mut self, metrics: ModelMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load all fertilizer artifacts. Every artifact except the scaler,
    /// metrics and catalog is required.
    pub fn from_config(config: &ArtifactConfig, artifacts: &FertilizerArtifacts) -> Result<Self> {
        let load_encoder = |path: &Path| {
            let path = config.resolve(path);
            LabelEncoder::from_file(&path).map_err(|e| {
                Error::model(format!("failed to load encoder {}: {e}", path.display()))
            })
        };

        let model_path = config.resolve(&artifacts.model);
        let model = RandomForest::from_file(&model_path).map_err(|e| {
            Error::model(format!(
                "failed to load fertilizer model {}: {e}",
                model_path.display()
            ))
        })?;
        info!(path = %model_path.display(), trees = model.n_trees(), "Loaded fertilizer model");

        let soil_encoder = load_encoder(artifacts.soil_encoder.as_path())?;
        let crop_encoder = load_encoder(artifacts.crop_encoder.as_path())?;
        let fertilizer_encoder = load_encoder(artifacts.fertilizer_encoder.as_path())?;

        let catalog = match &artifacts.info {
            Some(path) => FertilizerCatalog::from_file(config.resolve(path))?,
            None => FertilizerCatalog::builtin(),
        };

        let mut recommender = Self::new(
            Arc::new(model),
            fertilizer_encoder,
            soil_encoder,
            crop_encoder,
            catalog,
        );

        if let Some(path) = existing(config, artifacts.scaler.as_deref(), "Feature scaler") {
            recommender = recommender.with_scaler(StandardScaler::from_file(&path)?);
        }
        if let Some(path) = existing(config, artifacts.metrics.as_deref(), "Model metrics") {
            let content = std::fs::read_to_string(&path)?;
            recommender = recommender.with_metrics(serde_json::from_str(&content)?);
        }

        Ok(recommender)
    }

    /// Feature row in model column order, scaled when a scaler is present
    pub fn features(&self, input: &FertilizerInput) -> Result<Vec<f64>> {
        let soil = self.soil_encoder.transform(&input.soil_type).map_err(|_| {
            Error::invalid_input(format!("Unknown soil type: {}", input.soil_type))
        })?;
        let crop = self.crop_encoder.transform(&input.crop_type).map_err(|_| {
            Error::invalid_input(format!("Unknown crop type: {}", input.crop_type))
        })?;

        let row = vec![
            input.temperature,
            input.humidity,
            input.moisture,
            soil as f64,
            crop as f64,
            input.nitrogen,
            input.potassium,
            input.phosphorous,
        ];

        match &self.scaler {
            Some(scaler) => scaler.transform(&row),
            None => Ok(row),
        }
    }

    /// Recommend a fertilizer. Out-of-range readings are rejected with
    /// every violation listed.
    pub fn recommend(&self, input: &FertilizerInput) -> Result<FertilizerRecommendation> {
        let errors = validate_inputs(input);
        if !errors.is_empty() {
            return Err(Error::invalid_input(errors.join("; ")));
        }

        let features = self.features(input)?;
        let resolution = self.context.predict_label(&features)?;
        let confidence = self.context.max_probability(&features)?.map(|p| p * 100.0);
        debug!(fertilizer = %resolution.label, ?confidence, "Fertilizer predicted");

        Ok(FertilizerRecommendation {
            info: self.catalog.lookup(&resolution.label).clone(),
            fertilizer: resolution.label,
            confidence,
            label_source: resolution.source,
        })
    }

    pub fn soil_types(&self) -> &[String] {
        self.soil_encoder.classes()
    }

    pub fn crop_types(&self) -> &[String] {
        self.crop_encoder.classes()
    }

    pub fn metrics(&self) -> Option<&ModelMetrics> {
        self.metrics.as_ref()
    }

    pub fn context(&self) -> &PredictionContext {
        &self.context
    }
}

/// Resolved path of an optional artifact, or `None` when it is not
/// configured or not on disk
fn existing(config: &ArtifactConfig, path: Option<&Path>, what: &str) -> Option<PathBuf> {
    let path = config.resolve(path?);
    if path.exists() {
        Some(path)
    } else {
        warn!(path = %path.display(), "{what} not found, continuing without it");
        None
    }
}
