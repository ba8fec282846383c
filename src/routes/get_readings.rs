//! `GET /readings` – the most recent readings across all devices.

use axum::{
    extract::State, http::header::HeaderName, http::StatusCode, routing::get, Json, Router,
};
use serde_json::json;
use tracing::{error, info};

use super::{cors_headers, AppState, CorsJson};

// ---

/// Size of the recent window returned to the dashboard.
pub const RECENT_READINGS_LIMIT: u32 = 20;

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/readings", get(handler).options(preflight))
}

async fn handler(State(state): State<AppState>) -> CorsJson {
    // ---
    info!("GET /readings");

    match state.readings.recent_readings(RECENT_READINGS_LIMIT).await {
        Ok(items) => {
            info!("Returning {} readings", items.len());
            (StatusCode::OK, cors_headers(), Json(json!({ "data": items })))
        }
        Err(e) => {
            error!("Error fetching sensor data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                cors_headers(),
                Json(json!({ "message": format!("Internal server error: {}", e) })),
            )
        }
    }
}

async fn preflight() -> (StatusCode, [(HeaderName, &'static str); 3]) {
    (StatusCode::NO_CONTENT, cors_headers())
}
