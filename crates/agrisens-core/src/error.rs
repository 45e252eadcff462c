//! Error types for AgriSens

/// Result type alias using AgriSens's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for AgriSens operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model artifact is malformed or inconsistent
    #[error("model error: {0}")]
    Model(String),

    /// Model invocation errors (bad input shape, missing capability)
    #[error("prediction error: {0}")]
    Prediction(String),

    /// Label encoding errors
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Caller-supplied input failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new prediction error
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }

    /// Create a new encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
