//! AgriSens Server
//!
//! HTTP API for crop and fertilizer recommendation, farmer accounts and
//! weather lookup.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;
pub mod weather;

use axum::{body::Body, http::HeaderValue, http::Request, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;

/// Build the Axum application: API routes, static files, CORS and tracing
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let static_dir = state.config.static_dir.clone();

    let mut app = create_router(state);

    if let Some(dir) = static_dir {
        if dir.is_dir() {
            info!(dir = %dir.display(), "Serving static files");
            app = app.fallback_service(ServeDir::new(dir));
        } else {
            warn!(dir = %dir.display(), "Static directory not found, frontend disabled");
        }
    }

    app.layer(cors).layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %uuid::Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }),
    )
}

/// CORS from the configured origins; any origin when none are listed
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    match config.cors_origins() {
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}
