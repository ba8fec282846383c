use std::sync::Arc;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use cryosure_coldchain::notify::RecordingNotifier;
use cryosure_coldchain::routes;
use cryosure_coldchain::store::MemoryStore;
use cryosure_coldchain::AppState;

// ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadingDto {
    device_id: String,
    timestamp: f64,
    temperature: f64,
    humidity: f64,
    applied_profile_name: String,
    is_anomaly: bool,
    anomaly_details: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReadingsResponse {
    data: Vec<ReadingDto>,
}

struct TestApp {
    base: String,
    client: Client,
    readings: Arc<MemoryStore>,
    config: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    // ---
    async fn spawn() -> Result<TestApp> {
        // ---
        let readings = Arc::new(MemoryStore::new());
        let config = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let state = AppState {
            readings: readings.clone(),
            config: config.clone(),
            notifier: notifier.clone(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, routes::router(state)).await.ok();
        });

        Ok(TestApp {
            base: format!("http://{}", addr),
            client: Client::new(),
            readings,
            config,
            notifier,
        })
    }

    async fn ingest(&self, event: Value) -> Result<(StatusCode, String)> {
        let resp = self
            .client
            .post(format!("{}/ingest", self.base))
            .json(&event)
            .send()
            .await?;
        let status = resp.status();
        Ok((status, resp.text().await?))
    }

    async fn update_config(&self, body: Value) -> Result<(StatusCode, Value)> {
        let resp = self
            .client
            .post(format!("{}/config", self.base))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        Ok((status, resp.json().await?))
    }

    async fn active_config(&self) -> Result<Value> {
        let resp = self.client.get(format!("{}/config", self.base)).send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        Ok(resp.json().await?)
    }
}

fn reading(temp: f64, humidity: f64, ts: i64) -> Value {
    json!({
        "deviceId": "cryo-fridge-01",
        "temperature": temp,
        "humidity": humidity,
        "timestamp": ts
    })
}

// ---

#[tokio::test]
async fn normal_reading_is_stored_without_alert() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let (status, body) = app.ingest(reading(5.0, 50.0, 1_700_000_000)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Processing complete.");

    let stored = app.readings.readings();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].is_anomaly);
    assert_eq!(stored[0].anomaly_details, vec!["No anomaly".to_string()]);
    assert_eq!(stored[0].applied_profile_name, "Default (No Config Set)");
    assert!(app.notifier.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn high_temperature_is_flagged_and_alerted() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let (status, _) = app.ingest(reading(10.0, 50.0, 1_700_000_000)).await?;
    assert_eq!(status, StatusCode::OK);

    let stored = app.readings.readings();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_anomaly);
    assert_eq!(
        stored[0].anomaly_details,
        vec!["Temperature 10.0°C is outside range (2.0-8.0°C).".to_string()]
    );

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    let (subject, message) = &sent[0];
    assert_eq!(
        subject,
        "CryoSure ANOMALY: Device cryo-fridge-01 (Default (No Config Set))"
    );
    assert!(message.contains("Timestamp: 2023-11-14 22:13:20 UTC"));
    assert!(message.contains("Temp: 10.0°C (Range: 2.0-8.0°C)"));
    assert!(message.contains("Humidity: 50.0% (Max: 85.0%)"));

    Ok(())
}

#[tokio::test]
async fn missing_timestamp_is_client_error() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let event = json!({ "deviceId": "cryo-fridge-01", "temperature": 5.0, "humidity": 50.0 });
    let (status, body) = app.ingest(event).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing data.");
    assert!(app.readings.readings().is_empty());
    assert!(app.notifier.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn malformed_number_is_server_error() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let event = json!({
        "deviceId": "cryo-fridge-01",
        "temperature": "very cold",
        "humidity": 50.0,
        "timestamp": 1_700_000_000
    });
    let (status, body) = app.ingest(event).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Error: "), "{}", body);
    assert!(app.readings.readings().is_empty());

    Ok(())
}

#[tokio::test]
async fn unreachable_config_store_falls_back_to_defaults() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    app.config.set_unavailable(true);

    let (status, _) = app.ingest(reading(10.0, 50.0, 1_700_000_000)).await?;
    assert_eq!(status, StatusCode::OK);

    let stored = app.readings.readings();
    assert_eq!(stored[0].applied_profile_name, "Default (No Config Set)");
    assert!(stored[0].is_anomaly);

    let active = app.active_config().await?;
    assert_eq!(active["profileName"], "Default (No Config Set)");
    assert_eq!(active["minTemp"], 2.0);
    assert_eq!(active["maxTemp"], 8.0);
    assert_eq!(active["maxHumidity"], 85.0);

    Ok(())
}

#[tokio::test]
async fn unreachable_reading_store_fails_ingestion() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    app.readings.set_unavailable(true);

    let (status, _) = app.ingest(reading(10.0, 50.0, 1_700_000_000)).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.notifier.sent().is_empty(), "no alert without a stored reading");

    Ok(())
}

#[tokio::test]
async fn config_update_becomes_active_profile() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let (status, body) = app
        .update_config(json!({
            "storageType": "Vaccine",
            "minTemp": 2,
            "maxTemp": 8,
            "maxHumidity": 60
        }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Active thresholds set to: Vaccine");

    let active = app.active_config().await?;
    assert_eq!(active["profileName"], "Vaccine");
    assert_eq!(active["minTemp"], 2.0);
    assert_eq!(active["maxTemp"], 8.0);
    assert_eq!(active["maxHumidity"], 60.0);

    // Humidity 70 is fine by default but not for this profile
    app.ingest(reading(5.0, 70.0, 1_700_000_100)).await?;
    let stored = app.readings.readings();
    assert_eq!(stored[0].applied_profile_name, "Vaccine");
    assert_eq!(
        stored[0].anomaly_details,
        vec!["Humidity 70.0% is above limit (60%).".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn repeated_config_update_is_idempotent() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    let body = json!({ "storageType": "Dairy", "minTemp": 1, "maxTemp": 4, "maxHumidity": 75 });

    app.update_config(body.clone()).await?;
    let first = app.config.stored_profile();
    app.update_config(body).await?;
    let second = app.config.stored_profile();

    assert!(first.is_some());
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn config_update_missing_fields_is_rejected() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let (status, body) = app
        .update_config(json!({ "storageType": "", "minTemp": 2, "maxTemp": null }))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing one of the required fields: storageType, maxTemp, maxHumidity"
    );
    assert_eq!(body["debug"]["minTemp"], 2);
    assert!(app.config.stored_profile().is_none());

    Ok(())
}

#[tokio::test]
async fn config_update_accepts_inverted_range() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let (status, _) = app
        .update_config(json!({ "storageType": "Odd", "minTemp": 9, "maxTemp": 1, "maxHumidity": 50 }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let active = app.active_config().await?;
    assert_eq!(active["minTemp"], 9.0);
    assert_eq!(active["maxTemp"], 1.0);

    Ok(())
}

#[tokio::test]
async fn config_store_write_failure_is_server_error() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    app.config.set_unavailable(true);

    let (status, body) = app
        .update_config(json!({ "storageType": "Meat", "minTemp": -2, "maxTemp": 2, "maxHumidity": 80 }))
        .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Internal server error"));

    Ok(())
}

#[tokio::test]
async fn readings_returns_latest_twenty_newest_first() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    // Interleave arrival order so sorting is not just insertion order
    for i in (0..25).map(|i| (i * 7) % 25) {
        let (status, _) = app.ingest(reading(4.0, 40.0, 1_700_000_000 + i)).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let resp = app.client.get(format!("{}/readings", app.base)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let body: ReadingsResponse = resp.json().await?;
    assert_eq!(body.data.len(), 20);
    assert_eq!(body.data[0].timestamp, 1_700_000_024.0);
    assert_eq!(body.data[19].timestamp, 1_700_000_005.0);
    assert!(body
        .data
        .windows(2)
        .all(|w| w[0].timestamp > w[1].timestamp));

    let first = &body.data[0];
    assert_eq!(first.device_id, "cryo-fridge-01");
    assert_eq!(first.temperature, 4.0);
    assert_eq!(first.humidity, 40.0);
    assert_eq!(first.applied_profile_name, "Default (No Config Set)");
    assert!(!first.is_anomaly);
    assert_eq!(first.anomaly_details, vec!["No anomaly".to_string()]);

    Ok(())
}

#[tokio::test]
async fn preflight_answers_with_cors_headers() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    for path in ["readings", "config"] {
        let resp = app
            .client
            .request(reqwest::Method::OPTIONS, format!("{}/{}", app.base, path))
            .header("Origin", "http://dashboard.local")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await?;

        assert_eq!(resp.status(), StatusCode::NO_CONTENT, "OPTIONS /{}", path);
        let header = |name: &str| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(header("access-control-allow-origin").as_deref(), Some("*"));
        assert_eq!(
            header("access-control-allow-methods").as_deref(),
            Some("GET,POST,OPTIONS")
        );
        assert_eq!(
            header("access-control-allow-headers").as_deref(),
            Some("Content-Type")
        );
    }

    // Pre-flight must not touch the store
    assert!(app.readings.readings().is_empty());
    assert!(app.config.stored_profile().is_none());

    Ok(())
}

#[tokio::test]
async fn readings_store_failure_is_reported() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    app.readings.set_unavailable(true);

    let resp = app.client.get(format!("{}/readings", app.base)).send().await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = resp.json().await?;
    assert!(body.get("data").is_none());
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Internal server error"));

    Ok(())
}

#[tokio::test]
async fn health_is_ok() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let body: Value = app
        .client
        .get(format!("{}/health", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["status"], "ok");

    Ok(())
}

/// Smoke test against a running deployment, e.g. `BASE_URL=http://localhost:8080`.
#[tokio::test]
#[ignore = "requires a running service"]
async fn live_readings_endpoint() -> Result<()> {
    // ---
    let base = std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let body: ReadingsResponse = Client::new()
        .get(format!("{}/readings", base))
        .send()
        .await?
        .json()
        .await?;

    assert!(body.data.len() <= 20);
    for r in &body.data {
        assert!(!r.device_id.is_empty(), "device_id should not be empty");
        let expected = r.anomaly_details != vec!["No anomaly".to_string()];
        assert_eq!(r.is_anomaly, expected, "isAnomaly disagrees with details");
    }

    Ok(())
}
