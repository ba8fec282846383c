//! `POST /ingest` – evaluate and persist one telemetry message.
//!
//! The caller is the transport layer, so outcomes are a status code plus a
//! short text body. Nothing is retried here.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::active_profile::active_thresholds;
use crate::error::{ColdChainError, Result};
use crate::evaluator::{evaluate, Evaluation};
use crate::models::{IngestMessage, Reading};
use crate::notify::AnomalyAlert;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/ingest", post(handler))
}

async fn handler(State(state): State<AppState>, Json(event): Json<Value>) -> (StatusCode, String) {
    // ---
    info!("POST /ingest - Received event: {}", event);

    match process(&state, &event).await {
        Ok(_) => (StatusCode::OK, "Processing complete.".to_string()),
        Err(ColdChainError::MissingFields(fields)) => {
            warn!("Missing essential fields {:?}. Skipping: {}", fields, event);
            (StatusCode::BAD_REQUEST, "Missing data.".to_string())
        }
        Err(e) => {
            error!("Ingestion failed: {}. Event: {}", e, event);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}

/// Validate, evaluate, persist and, when anomalous, notify.
///
/// The reading is written before any alert goes out; a failed write means no
/// alert.
async fn process(state: &AppState, event: &Value) -> Result<Evaluation> {
    // ---
    let msg = IngestMessage::from_json(event)?;

    let thresholds = active_thresholds(state.config.as_ref()).await;
    debug!(
        "Applying thresholds for '{}': Temp {}-{}°C, Humidity <= {}%",
        thresholds.profile_name, thresholds.min_temp, thresholds.max_temp, thresholds.max_humidity
    );

    let evaluation = evaluate(msg.temperature, msg.humidity, &thresholds);

    let reading = Reading {
        device_id: msg.device_id.clone(),
        timestamp: msg.timestamp,
        temperature: msg.temperature,
        humidity: msg.humidity,
        applied_profile_name: thresholds.profile_name.clone(),
        is_anomaly: evaluation.is_anomaly,
        anomaly_details: evaluation.details.clone(),
    };
    state.readings.put_reading(&reading).await?;
    info!("Data stored for {}. Anomaly: {}", msg.device_id, evaluation.is_anomaly);

    if evaluation.is_anomaly {
        let alert = AnomalyAlert::new(&msg, &thresholds, &evaluation);
        state.notifier.publish(&alert.subject, &alert.message).await?;
        info!("Alert sent for {}", msg.device_id);
    }

    Ok(evaluation)
}
