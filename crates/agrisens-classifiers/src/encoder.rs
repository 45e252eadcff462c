//! Fitted preprocessing artifacts: label encoders and feature scalers

use crate::classifier::LabelDecoder;
use agrisens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bidirectional mapping between class names and their encoded indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Create an encoder from its fitted `classes_`
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Load an encoder from a JSON artifact (`{"classes": [...]}`)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse an encoder from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let encoder: Self = serde_json::from_str(json)?;
        if encoder.classes.is_empty() {
            return Err(Error::encoding("label encoder has no classes"));
        }
        Ok(encoder)
    }

    /// Fitted classes, in encoded order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode a class name
    pub fn transform(&self, name: &str) -> Result<i64> {
        self.classes
            .iter()
            .position(|c| c == name)
            .map(|i| i as i64)
            .ok_or_else(|| Error::encoding(format!("unknown label: {name}")))
    }

    /// Decode an index back to its class name
    pub fn inverse_transform(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }
}

impl LabelDecoder for LabelEncoder {
    fn try_decode(&self, index: i64) -> Option<String> {
        self.inverse_transform(index).map(str::to_string)
    }
}

/// Per-feature standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != scale.len() {
            return Err(Error::model(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        Ok(Self { mean, scale })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: Self = serde_json::from_str(&content)?;
        Self::new(raw.mean, raw.scale)
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.mean.len() {
            return Err(Error::prediction(format!(
                "scaler expects {} features, got {}",
                self.mean.len(),
                features.len()
            )));
        }

        // Zero-variance features are left centred but unscaled.
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_round_trip() {
        let encoder =
            LabelEncoder::from_json(r#"{"classes": ["Clayey", "Loamy", "Sandy"]}"#).unwrap();
        assert_eq!(encoder.transform("Loamy").unwrap(), 1);
        assert_eq!(encoder.inverse_transform(2), Some("Sandy"));
    }

    #[test]
    fn test_encoder_out_of_range() {
        let encoder = LabelEncoder::new(vec!["a".to_string()]);
        assert_eq!(encoder.inverse_transform(1), None);
        assert_eq!(encoder.inverse_transform(-1), None);
        assert_eq!(encoder.try_decode(-1), None);
    }

    #[test]
    fn test_encoder_unknown_label() {
        let encoder = LabelEncoder::new(vec!["a".to_string()]);
        let err = encoder.transform("b").unwrap_err();
        assert!(err.to_string().contains("unknown label: b"));
    }

    #[test]
    fn test_encoder_rejects_empty() {
        assert!(LabelEncoder::from_json(r#"{"classes": []}"#).is_err());
    }

    #[test]
    fn test_scaler() {
        let scaler = StandardScaler::new(vec![10.0, 0.0], vec![2.0, 0.0]).unwrap();
        assert_eq!(scaler.transform(&[14.0, 3.0]).unwrap(), vec![2.0, 3.0]);
        assert!(scaler.transform(&[1.0]).is_err());
    }

    #[test]
    fn test_scaler_shape_mismatch() {
        assert!(StandardScaler::new(vec![1.0], vec![]).is_err());
    }
}
