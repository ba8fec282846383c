//! `POST /config` replaces the active threshold profile; `GET /config` shows
//! the profile ingestion would apply right now.

use axum::{
    extract::State, http::header::HeaderName, http::StatusCode, routing::get, Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{cors_headers, AppState, CorsJson};
use crate::active_profile::active_thresholds;
use crate::error::ColdChainError;
use crate::models::{ConfigUpdate, ThresholdProfile};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route(
        "/config",
        get(current).post(update).options(preflight),
    )
}

async fn update(State(state): State<AppState>, Json(body): Json<Value>) -> CorsJson {
    // ---
    info!("POST /config - Received body: {}", body);

    let profile: ThresholdProfile = match ConfigUpdate::from_json(&body) {
        Ok(update) => update.into(),
        Err(e) if e.is_validation() => {
            warn!("Rejected config update: {}", e);
            return (StatusCode::BAD_REQUEST, cors_headers(), Json(rejection(&e, &body)));
        }
        Err(e) => return internal_error(e),
    };

    // Fail-closed: a write that did not land is reported, never assumed
    match state.config.put_active_profile(&profile).await {
        Ok(()) => {
            info!("Active thresholds updated for profile '{}'", profile.profile_name);
            (
                StatusCode::OK,
                cors_headers(),
                Json(json!({
                    "message": format!("Active thresholds set to: {}", profile.profile_name)
                })),
            )
        }
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: ColdChainError) -> CorsJson {
    // ---
    error!("Failed to store active thresholds: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        cors_headers(),
        Json(json!({ "message": format!("Internal server error: {}", e) })),
    )
}

async fn current(State(state): State<AppState>) -> CorsJson {
    // ---
    let profile = active_thresholds(state.config.as_ref()).await;
    (StatusCode::OK, cors_headers(), Json(json!(profile)))
}

async fn preflight() -> (StatusCode, [(HeaderName, &'static str); 3]) {
    (StatusCode::NO_CONTENT, cors_headers())
}

/// 400 body: a message naming the problem plus the fields as received.
fn rejection(err: &ColdChainError, body: &Value) -> Value {
    // ---
    let message = match err {
        ColdChainError::MissingFields(fields) => {
            format!("Missing one of the required fields: {}", fields.join(", "))
        }
        ColdChainError::InvalidNumber { field, value } => {
            format!("Field {} is not a number: {}", field, value)
        }
        other => other.to_string(),
    };

    let echo = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);
    json!({
        "message": message,
        "debug": {
            "storageType": echo("storageType"),
            "minTemp": echo("minTemp"),
            "maxTemp": echo("maxTemp"),
            "maxHumidity": echo("maxHumidity"),
        }
    })
}
