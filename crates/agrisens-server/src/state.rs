//! Shared application state

use agrisens_classifiers::RecommenderRegistry;
use agrisens_store::Database;
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::weather::{OpenWeatherClient, WeatherProvider};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Crop and fertilizer recommenders
    pub registry: RecommenderRegistry,

    /// Accounts and farm profiles
    pub db: Database,

    /// Weather lookup; `None` when no API key is configured
    pub weather: Option<Arc<dyn WeatherProvider>>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Initialize application state from configuration
    pub fn new(config: ServerConfig, metrics_handle: Option<PrometheusHandle>) -> Result<Self> {
        info!("Initializing application state");

        let registry = RecommenderRegistry::from_config(&config.artifacts)
            .context("Failed to load recommenders")?;

        let db = Database::open(&config.database)
            .with_context(|| format!("Failed to open database {}", config.database.display()))?;

        let weather: Option<Arc<dyn WeatherProvider>> = match &config.weather.api_key {
            Some(key) if !key.is_empty() => {
                info!(url = %config.weather.api_url, "Weather lookup enabled");
                Some(Arc::new(OpenWeatherClient::new(&config.weather, key.clone())?))
            }
            _ => {
                warn!("No OpenWeatherMap API key configured, weather lookup disabled");
                None
            }
        };

        Ok(Self::from_parts(config, registry, db, weather, metrics_handle))
    }

    /// Assemble state from already constructed parts
    pub fn from_parts(
        config: ServerConfig,
        registry: RecommenderRegistry,
        db: Database,
        weather: Option<Arc<dyn WeatherProvider>>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            db,
            weather,
            metrics_handle,
        }
    }
}
