//! HTTP routes and handlers

use agrisens_classifiers::{validate_inputs, FertilizerInput, FertilizerRecommender, LabelSource};
use agrisens_core::{SoilReading, CROP_FEATURES};
use agrisens_store::{FarmUpdate, StoreError};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::state::AppState;
use crate::weather::WeatherError;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/predict", post(predict_crop))
        .route("/fertilizer/predict", post(predict_fertilizer))
        .route("/fertilizer/options", get(fertilizer_options))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/farms/:user_id", get(get_farm).put(update_farm))
        .route("/weather", get(weather))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

fn count_request(route: &'static str) {
    metrics::counter!("agrisens_requests_total", "route" => route).increment(1);
}

fn record_prediction(model: &'static str, source: LabelSource, started: Instant) {
    metrics::counter!("agrisens_predictions_total", "model" => model).increment(1);
    if source.is_fallback() {
        metrics::counter!(
            "agrisens_label_fallbacks_total",
            "model" => model,
            "source" => source.as_str()
        )
        .increment(1);
    }
    metrics::histogram!("agrisens_prediction_latency_us", "model" => model)
        .record(started.elapsed().as_micros() as f64);
}

/// Parse a request body as a JSON object
fn json_object(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AppError::BadRequest("Invalid JSON body".to_string())),
    }
}

/// Parse a request body into a typed payload
fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(json_object(body)?))
        .map_err(|e| AppError::BadRequest(format!("Invalid request: {e}")))
}

/// A numeric field given as a number or a numeric string
fn number_field(data: &Map<String, Value>, key: &str) -> Result<f64, AppError> {
    let value = data
        .get(key)
        .ok_or_else(|| AppError::BadRequest(format!("Missing field: {key}")))?;

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.ok_or_else(|| AppError::BadRequest(format!("Invalid value for field: {key}")))
}

fn string_field(data: &Map<String, Value>, key: &str) -> Result<Option<String>, AppError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(AppError::BadRequest(format!("Invalid value for field: {key}"))),
    }
}

/// Soil reading from a `/predict` body. Fields are checked in model column order.
fn parse_reading(data: &Map<String, Value>) -> Result<SoilReading, AppError> {
    for key in CROP_FEATURES {
        if !data.contains_key(key) {
            return Err(AppError::BadRequest(format!("Missing field: {key}")));
        }
    }

    Ok(SoilReading {
        nitrogen: number_field(data, "nitrogen")?,
        phosphorus: number_field(data, "phosphorus")?,
        potassium: number_field(data, "potassium")?,
        temperature: number_field(data, "temperature")?,
        humidity: number_field(data, "humidity")?,
        ph: number_field(data, "ph")?,
        rainfall: number_field(data, "rainfall")?,
    })
}

/// Crop recommendation handler
async fn predict_crop(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    count_request("predict");
    let data = json_object(&body)?;
    let reading = parse_reading(&data)?;

    let started = Instant::now();
    let recommendation = state.registry.crop().recommend(&reading).map_err(|e| {
        error!(error = %e, "Crop prediction failed");
        AppError::Internal(e.to_string())
    })?;
    record_prediction("crop", recommendation.label_source, started);

    info!(
        prediction = %recommendation.prediction,
        source = %recommendation.label_source,
        ranked = recommendation.ranked.as_ref().map_or(0, Vec::len),
        "Crop recommended"
    );
    Ok(Json(recommendation).into_response())
}

fn fertilizer_recommender(state: &AppState) -> Result<&FertilizerRecommender, AppError> {
    state.registry.fertilizer().ok_or_else(|| {
        AppError::Unavailable("Fertilizer recommendation is not configured".to_string())
    })
}

/// Fertilizer recommendation handler
async fn predict_fertilizer(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    count_request("fertilizer_predict");
    let recommender = fertilizer_recommender(&state)?;
    let data = json_object(&body)?;

    let user_id = match data.get("user_id") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_i64()
                .ok_or_else(|| {
                    AppError::BadRequest("Invalid value for field: user_id".to_string())
                })?,
        ),
    };

    let soil_type = match (string_field(&data, "soil_type")?, user_id) {
        (Some(soil), _) => soil,
        (None, Some(user_id)) => {
            let db = state.db.clone();
            let farm = blocking(move || db.get_farm_details(user_id)).await?;
            farm.and_then(|f| f.soil_type)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::BadRequest("Missing field: soil_type".to_string()))?
        }
        (None, None) => return Err(AppError::BadRequest("Missing field: soil_type".to_string())),
    };

    let crop_type = string_field(&data, "crop_type")?
        .ok_or_else(|| AppError::BadRequest("Missing field: crop_type".to_string()))?;

    let input = FertilizerInput {
        temperature: number_field(&data, "temperature")?,
        humidity: number_field(&data, "humidity")?,
        moisture: number_field(&data, "moisture")?,
        soil_type,
        crop_type,
        nitrogen: number_field(&data, "nitrogen")?,
        potassium: number_field(&data, "potassium")?,
        phosphorous: number_field(&data, "phosphorous")?,
    };

    let details = validate_inputs(&input);
    if !details.is_empty() {
        debug!(?details, "Fertilizer input rejected");
        return Err(AppError::Validation(details));
    }

    let started = Instant::now();
    let recommendation = recommender.recommend(&input)?;
    record_prediction("fertilizer", recommendation.label_source, started);

    info!(
        fertilizer = %recommendation.fertilizer,
        confidence = ?recommendation.confidence,
        "Fertilizer recommended"
    );
    Ok(Json(recommendation).into_response())
}

async fn fertilizer_options(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    count_request("fertilizer_options");
    let recommender = fertilizer_recommender(&state)?;

    let mut body = json!({
        "soil_types": recommender.soil_types(),
        "crop_types": recommender.crop_types(),
    });
    if let Some(metrics) = recommender.metrics() {
        body["metrics"] = json!(metrics);
    }
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    id: i64,
    username: String,
}

async fn signup(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    count_request("signup");
    let credentials: Credentials = json_body(&body)?;
    let username = credentials.username.trim().to_string();
    if username.is_empty() || credentials.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required.".to_string(),
        ));
    }

    let db = state.db.clone();
    let name = username.clone();
    let created = blocking(move || db.add_user(&name, &credentials.password)).await?;
    if !created {
        return Err(AppError::Conflict("Username already exists.".to_string()));
    }

    info!(username = %username, "Account created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Account created successfully.", "username": username })),
    )
        .into_response())
}

async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, AppError> {
    count_request("login");
    let credentials: Credentials = json_body(&body)?;

    let db = state.db.clone();
    let user = blocking(move || db.check_user(credentials.username.trim(), &credentials.password))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    debug!(user_id = user.id, "Login succeeded");
    Ok(Json(LoginResponse {
        id: user.id,
        username: user.username,
    }))
}

async fn get_farm(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    count_request("farm_get");
    let db = state.db.clone();
    let farm = blocking(move || db.get_farm_details(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No farm profile for user {user_id}")))?;
    Ok(Json(farm).into_response())
}

async fn update_farm(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    body: Bytes,
) -> Result<Response, AppError> {
    count_request("farm_update");
    let update: FarmUpdate = json_body(&body)?;

    let db = state.db.clone();
    let farm = blocking(move || db.update_farm_details(user_id, &update)).await?;
    info!(user_id, "Farm profile updated");
    Ok(Json(farm).into_response())
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: Option<String>,
}

async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Response, AppError> {
    count_request("weather");
    let provider = state
        .weather
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Weather lookup is not configured".to_string()))?;

    let city = query
        .city
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.config.weather.default_city.clone());

    let report = provider.current(&city).await?;
    Ok(Json(report).into_response())
}

/// Run a database call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Database task failed: {e}")))?
        .map_err(AppError::from)
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Validation(Vec<String>),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    BadGateway(String),
    Internal(String),
}

impl From<agrisens_core::Error> for AppError {
    fn from(err: agrisens_core::Error) -> Self {
        match err {
            agrisens_core::Error::InvalidInput(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownUser(id) => AppError::NotFound(format!("Unknown user: {id}")),
            StoreError::InvalidInput(msg) => AppError::BadRequest(msg),
            StoreError::Database(e) => {
                error!(error = %e, "Database error");
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::CityNotFound(_) => AppError::NotFound(err.to_string()),
            other => {
                warn!(error = %other, "Weather lookup failed");
                AppError::BadGateway(other.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid input values", "details": details }),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": msg }))
            }
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}
