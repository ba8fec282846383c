use std::sync::Arc;

use axum::http::header::{self, HeaderName};
use axum::http::StatusCode;
use axum::{Json, Router};
use serde_json::Value;

use crate::notify::Notifier;
use crate::store::{ConfigStore, ReadingStore};

mod get_readings;
mod health;
mod ingest;
mod update_config;

pub use get_readings::RECENT_READINGS_LIMIT;

// ---

/// Dependencies shared by every route; immutable after startup.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub readings: Arc<dyn ReadingStore>,
    pub config: Arc<dyn ConfigStore>,
    pub notifier: Arc<dyn Notifier>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(ingest::router())
        .merge(get_readings::router())
        .merge(update_config::router())
        .merge(health::router())
        .with_state(state)
}

/// JSON response carrying the CORS header set.
pub(crate) type CorsJson = (StatusCode, [(HeaderName, &'static str); 3], Json<Value>);

/// Permissive cross-origin headers for the browser dashboard.
pub(crate) fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,POST,OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}
