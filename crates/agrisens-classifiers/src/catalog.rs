//! Descriptive catalogs used to enrich predictions for display

use agrisens_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Returned when a crop has no catalog entry
pub const NO_CROP_INFO: &str = "No information available for this crop.";

/// Lowercase class name -> free-text description
#[derive(Debug, Clone, Default)]
pub struct InfoCatalog {
    entries: HashMap<String, String>,
}

impl InfoCatalog {
    /// Build a catalog; keys are lowercased
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    /// Load from a JSON object of name -> description
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Description for a label, ignoring case
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(&label.to_lowercase()).map(String::as_str)
    }

    /// Description for a label, or [`NO_CROP_INFO`]
    pub fn lookup(&self, label: &str) -> &str {
        self.get(label).unwrap_or(NO_CROP_INFO)
    }

    /// Known class names (lowercase, unordered)
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Agronomic details for a fertilizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerInfo {
    pub description: String,
    pub benefits: Vec<String>,
    pub rate: String,
}

impl FertilizerInfo {
    fn new(description: &str, benefits: &[&str], rate: &str) -> Self {
        Self {
            description: description.to_string(),
            benefits: benefits.iter().map(|b| b.to_string()).collect(),
            rate: rate.to_string(),
        }
    }

    /// Used for fertilizers with no catalog entry
    pub fn unknown() -> Self {
        Self::new("Specialized blend.", &["Optimized nutrition"], "As per soil test")
    }
}

/// Fertilizer name -> details
#[derive(Debug, Clone)]
pub struct FertilizerCatalog {
    entries: HashMap<String, FertilizerInfo>,
    unknown: FertilizerInfo,
}

impl FertilizerCatalog {
    pub fn new(entries: HashMap<String, FertilizerInfo>) -> Self {
        Self {
            entries,
            unknown: FertilizerInfo::unknown(),
        }
    }

    /// The common NPK products
    pub fn builtin() -> Self {
        let entries = [
            (
                "Urea",
                FertilizerInfo::new(
                    "High nitrogen content (46% N).",
                    &["Promotes leafy growth", "Improves protein content"],
                    "100-200 kg/ha",
                ),
            ),
            (
                "DAP",
                FertilizerInfo::new(
                    "Di-ammonium Phosphate (18% N, 46% P₂O₅).",
                    &["Root development", "Early plant growth"],
                    "50-100 kg/ha",
                ),
            ),
            (
                "14-35-14",
                FertilizerInfo::new(
                    "NPK complex (14% N, 35% P₂O₅, 14% K₂O).",
                    &["Balanced nutrition", "Root development"],
                    "150-250 kg/ha",
                ),
            ),
            (
                "28-28",
                FertilizerInfo::new(
                    "NPK fertilizer (28% N, 28% P₂O₅).",
                    &["Balanced N-P nutrition", "Strong root system"],
                    "100-150 kg/ha",
                ),
            ),
            (
                "17-17-17",
                FertilizerInfo::new(
                    "Balanced NPK (17% each N, P₂O₅, K₂O).",
                    &["Complete balanced nutrition", "All-round growth"],
                    "150-200 kg/ha",
                ),
            ),
            (
                "20-20",
                FertilizerInfo::new(
                    "NPK fertilizer (20% N, 20% P₂O₅).",
                    &["Good N-P balance", "Vigorous growth"],
                    "125-175 kg/ha",
                ),
            ),
            (
                "10-26-26",
                FertilizerInfo::new(
                    "NPK fertilizer (10% N, 26% P₂O₅, 26% K₂O).",
                    &["High P-K content", "Disease resistance"],
                    "100-200 kg/ha",
                ),
            ),
        ];

        Self::new(
            entries
                .into_iter()
                .map(|(name, info)| (name.to_string(), info))
                .collect(),
        )
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, FertilizerInfo> = serde_json::from_str(&content)?;
        Ok(Self::new(entries))
    }

    /// Details for a fertilizer: exact name first, then ignoring case
    pub fn lookup(&self, name: &str) -> &FertilizerInfo {
        self.entries
            .get(name)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .unwrap_or(&self.unknown)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for FertilizerCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
