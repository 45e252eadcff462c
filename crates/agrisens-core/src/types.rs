//! Core types for AgriSens

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A class label as produced by a classifier.
///
/// Models trained on label-encoded targets emit integer indices, models
/// trained on raw targets emit names. Anything else a model (or a caller)
/// hands over is kept verbatim as its string representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "Value")]
pub enum ClassLabel {
    /// Encoded class index
    Index(i64),

    /// Class name
    Name(String),

    /// Any other raw value, stringified
    Opaque(String),
}

impl ClassLabel {
    /// Convert a raw JSON value into a label.
    ///
    /// A length-1 array is unwrapped first (one level), mirroring the shape
    /// of a single-row `predict` output.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) if items.len() == 1 => Self::from_scalar(&items[0]),
            other => Self::from_scalar(other),
        }
    }

    fn from_scalar(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Index(i),
                None => Self::Opaque(n.to_string()),
            },
            Value::String(s) => Self::Name(s.clone()),
            other => Self::Opaque(other.to_string()),
        }
    }

    /// Returns the encoded index, if this label is one
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<Value> for ClassLabel {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl From<i64> for ClassLabel {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ClassLabel {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ClassLabel {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(s) | Self::Opaque(s) => f.write_str(s),
        }
    }
}

impl Serialize for ClassLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Index(i) => serializer.serialize_i64(*i),
            Self::Name(s) | Self::Opaque(s) => serializer.serialize_str(s),
        }
    }
}

/// Names of the crop model's input features, in model column order
pub const CROP_FEATURES: [&str; 7] = [
    "nitrogen",
    "phosphorus",
    "potassium",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

/// Soil and climate readings fed to the crop recommendation model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    /// Nitrogen content (kg/ha)
    pub nitrogen: f64,

    /// Phosphorus content (kg/ha)
    pub phosphorus: f64,

    /// Potassium content (kg/ha)
    pub potassium: f64,

    /// Temperature (°C)
    pub temperature: f64,

    /// Relative humidity (%)
    pub humidity: f64,

    /// Soil pH
    pub ph: f64,

    /// Rainfall (mm)
    pub rainfall: f64,
}

impl SoilReading {
    /// Feature row in model column order
    pub fn to_row(&self) -> [f64; 7] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}
