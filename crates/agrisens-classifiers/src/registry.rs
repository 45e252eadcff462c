//! Recommender registry initialization

use crate::config::ArtifactConfig;
use crate::crop::CropRecommender;
use crate::fertilizer::FertilizerRecommender;
use agrisens_core::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// All loaded recommenders, shared read-only between requests
#[derive(Debug, Clone)]
pub struct RecommenderRegistry {
    crop: Arc<CropRecommender>,
    fertilizer: Option<Arc<FertilizerRecommender>>,
}

impl RecommenderRegistry {
    pub fn new(crop: CropRecommender, fertilizer: Option<FertilizerRecommender>) -> Self {
        Self {
            crop: Arc::new(crop),
            fertilizer: fertilizer.map(Arc::new),
        }
    }

    /// Load every configured recommender.
    ///
    /// The crop model is required. A fertilizer model that fails to load
    /// is logged and left disabled.
    pub fn from_config(config: &ArtifactConfig) -> Result<Self> {
        info!(models_dir = %config.models_dir.display(), "Initializing recommenders");

        let crop = CropRecommender::from_config(config)?;

        let fertilizer = match &config.fertilizer {
            Some(artifacts) => match FertilizerRecommender::from_config(config, artifacts) {
                Ok(recommender) => {
                    info!(
                        soil_types = recommender.soil_types().len(),
                        crop_types = recommender.crop_types().len(),
                        "✓ Loaded fertilizer recommender"
                    );
                    Some(recommender)
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "✗ Failed to load fertilizer recommender, feature disabled"
                    );
                    None
                }
            },
            None => {
                info!("Fertilizer recommender not configured");
                None
            }
        };

        Ok(Self::new(crop, fertilizer))
    }

    /// Load from an artifact configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = load_config(path)?;
        Self::from_config(&config)
    }

    pub fn crop(&self) -> &CropRecommender {
        &self.crop
    }

    pub fn fertilizer(&self) -> Option<&FertilizerRecommender> {
        self.fertilizer.as_deref()
    }
}

/// Load artifact configuration from file
pub fn load_config(path: impl AsRef<Path>) -> Result<ArtifactConfig> {
    ArtifactConfig::from_file(path.as_ref()).map_err(|e| {
        agrisens_core::Error::config(format!("Failed to load artifact config: {}", e))
    })
}
