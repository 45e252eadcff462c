//! Current weather lookup via OpenWeatherMap

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::WeatherConfig;

/// Weather lookup failures
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("City not found: {0}. Please check the spelling.")]
    CityNotFound(String),

    #[error("Invalid API key. Please check your OpenWeatherMap API key.")]
    InvalidApiKey,

    #[error("Weather service returned {0}")]
    Upstream(StatusCode),

    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Current conditions for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub name: String,
    pub country: String,
    pub description: String,
    pub icon_url: String,
    /// Degrees Celsius
    pub temperature: f64,
    pub feels_like: f64,
    /// Percent
    pub humidity: f64,
    /// Metres per second
    pub wind_speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Source of current weather data
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError>;
}

/// URL of the 2x icon for an OpenWeatherMap icon code
pub fn icon_url(icon: &str) -> String {
    format!("http://openweathermap.org/img/wn/{icon}@2x.png")
}

/// OpenWeatherMap current-weather client
pub struct OpenWeatherClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig, api_key: impl Into<String>) -> Result<Self, WeatherError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(WeatherError::CityNotFound(city.to_string())),
            StatusCode::UNAUTHORIZED => return Err(WeatherError::InvalidApiKey),
            status if !status.is_success() => return Err(WeatherError::Upstream(status)),
            _ => {}
        }

        let body: CurrentWeather = response.json().await?;
        debug!(city, name = %body.name, "Weather fetched");
        Ok(body.into_report())
    }
}

/// Subset of the current-weather response we use
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: String,
    #[serde(default)]
    sys: Sys,
    #[serde(default)]
    weather: Vec<Condition>,
    main: Main,
    #[serde(default)]
    wind: Wind,
    dt: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

impl CurrentWeather {
    fn into_report(self) -> WeatherReport {
        let (description, icon) = self
            .weather
            .into_iter()
            .next()
            .map(|c| (c.description, icon_url(&c.icon)))
            .unwrap_or_default();

        WeatherReport {
            name: self.name,
            country: self.sys.country,
            description,
            icon_url: icon,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            observed_at: self.dt.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}
