//! Configuration for model artifacts

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of all model artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Base directory for relative artifact paths
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Crop recommendation artifacts
    #[serde(default)]
    pub crop: CropArtifacts,

    /// Fertilizer recommendation artifacts (optional feature)
    #[serde(default)]
    pub fertilizer: Option<FertilizerArtifacts>,
}

/// Crop recommendation model and its companions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropArtifacts {
    /// Random forest export
    #[serde(default = "default_crop_model")]
    pub model: PathBuf,

    /// Label encoder fitted on the crop targets. Looked for by default;
    /// when missing or unreadable integer predictions use the alphabetical
    /// fallback. Set to `null` to skip it.
    #[serde(default = "default_crop_encoder")]
    pub label_encoder: Option<PathBuf>,

    /// Crop descriptions
    #[serde(default = "default_crop_info")]
    pub info: PathBuf,

    /// Class names for the alphabetical fallback. Defaults to the info
    /// catalog's keys.
    #[serde(default)]
    pub fallback_classes: Option<Vec<String>>,

    /// Number of ranked alternatives returned with each prediction
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for CropArtifacts {
    fn default() -> Self {
        Self {
            model: default_crop_model(),
            label_encoder: default_crop_encoder(),
            info: default_crop_info(),
            fallback_classes: None,
            top_k: default_top_k(),
        }
    }
}

/// Fertilizer recommendation model and encoders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertilizerArtifacts {
    pub model: PathBuf,
    pub soil_encoder: PathBuf,
    pub crop_encoder: PathBuf,
    pub fertilizer_encoder: PathBuf,

    /// Feature scaler applied before prediction
    #[serde(default)]
    pub scaler: Option<PathBuf>,

    /// Held-out evaluation metrics, for display
    #[serde(default)]
    pub metrics: Option<PathBuf>,

    /// Fertilizer details; built-in catalog when absent
    #[serde(default)]
    pub info: Option<PathBuf>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            crop: CropArtifacts::default(),
            fertilizer: None,
        }
    }
}

impl ArtifactConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }

    /// Resolve an artifact path against `models_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.models_dir.join(path)
        }
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_crop_model() -> PathBuf {
    PathBuf::from("RandomForest.json")
}

fn default_crop_encoder() -> Option<PathBuf> {
    Some(PathBuf::from("LabelEncoder.json"))
}

fn default_crop_info() -> PathBuf {
    PathBuf::from("crop_info.json")
}

fn default_top_k() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_config_yaml() {
        let yaml = r#"
models_dir: ./models
crop:
  model: RF.json
  label_encoder: LabelEncoder.json
  top_k: 5
fertilizer:
  model: Fertilizer_RF.json
  soil_encoder: soil_encoder.json
  crop_encoder: crop_encoder.json
  fertilizer_encoder: fertilizer_encoder.json
  scaler: feature_scaler.json
"#;

        let config = ArtifactConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.crop.model, PathBuf::from("RF.json"));
        assert_eq!(config.crop.info, PathBuf::from("crop_info.json"));
        assert_eq!(config.crop.top_k, 5);
        let fertilizer = config.fertilizer.as_ref().unwrap();
        assert!(fertilizer.metrics.is_none());
        assert_eq!(
            config.resolve(&fertilizer.model),
            PathBuf::from("./models/Fertilizer_RF.json")
        );
    }

    #[test]
    fn test_defaults() {
        let config = ArtifactConfig::from_yaml("{}").unwrap();
        assert_eq!(config.crop.model, PathBuf::from("RandomForest.json"));
        assert_eq!(config.crop.top_k, 3);
        assert_eq!(
            config.crop.label_encoder,
            Some(PathBuf::from("LabelEncoder.json"))
        );
        assert!(config.fertilizer.is_none());

        let skipped = ArtifactConfig::from_yaml("crop:\n  label_encoder: null\n").unwrap();
        assert!(skipped.crop.label_encoder.is_none());
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let config = ArtifactConfig::default();
        let absolute = std::env::temp_dir().join("model.json");
        assert_eq!(config.resolve(&absolute), absolute);
    }
}
