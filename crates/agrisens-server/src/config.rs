//! Server configuration

use agrisens_classifiers::ArtifactConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Model artifact locations
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// SQLite database for accounts and farm profiles
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory of static frontend files, served for unmatched paths
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Comma-separated CORS origins; `*` or empty allows any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,

    /// Weather lookup
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(models_dir) = &cli.models_dir {
            config.artifacts.models_dir = models_dir.clone();
        }

        if let Some(database) = &cli.database {
            config.database = database.clone();
        }

        if let Some(origins) = &cli.allowed_origins {
            config.allowed_origins = origins.clone();
        }

        if let Some(key) = &cli.weather_api_key {
            config.weather.api_key = Some(key.clone());
        }

        Ok(config)
    }

    /// Parse from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Configured CORS origins, or `None` when any origin is allowed
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let trimmed = self.allowed_origins.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return None;
        }
        Some(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactConfig::default(),
            database: default_database(),
            static_dir: None,
            allowed_origins: default_allowed_origins(),
            weather: WeatherConfig::default(),
        }
    }
}

/// OpenWeatherMap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Current-weather endpoint
    #[serde(default = "default_weather_url")]
    pub api_url: String,

    /// API key; the weather route is disabled without one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,

    /// City used when a request names none
    #[serde(default = "default_city")]
    pub default_city: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_weather_url(),
            api_key: None,
            timeout_secs: default_weather_timeout(),
            default_city: default_city(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("agrisens.db")
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_weather_timeout() -> u64 {
    10
}

fn default_city() -> String {
    "New Delhi".to_string()
}
