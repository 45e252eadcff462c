//! AgriSens Core
//!
//! Core types and error handling shared across AgriSens components.
//!
//! This crate provides:
//! - Class labels as produced by trained classifiers
//! - Soil and climate readings fed to the crop model
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ClassLabel, SoilReading, CROP_FEATURES};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ClassLabel, SoilReading};
}
