//! Anomaly notifications.
//!
//! Alerts go to a single fixed channel. Delivery is fire-and-forget: the
//! webhook's response is never inspected, only a transport failure counts.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::evaluator::Evaluation;
use crate::models::{IngestMessage, ThresholdProfile};

// ---

#[async_trait]
pub trait Notifier: Send + Sync {
    // ---
    async fn publish(&self, subject: &str, message: &str) -> Result<()>;
}

/// Posts `{channel, subject, message}` as JSON to a webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    // ---
    client: reqwest::Client,
    url: String,
    channel: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    channel: &'a str,
    subject: &'a str,
    message: &'a str,
}

impl WebhookNotifier {
    // ---
    pub fn new(url: &str, channel: &str) -> Self {
        WebhookNotifier {
            client: reqwest::Client::new(),
            url: url.to_string(),
            channel: channel.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    // ---
    async fn publish(&self, subject: &str, message: &str) -> Result<()> {
        // ---
        let payload = WebhookPayload {
            channel: &self.channel,
            subject,
            message,
        };

        self.client.post(&self.url).json(&payload).send().await?;
        debug!("Alert '{}' handed to channel {}", subject, self.channel);
        Ok(())
    }
}

/// Keeps every published alert in memory; used by tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// `(subject, message)` pairs in publish order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((subject.to_string(), message.to_string()));
        Ok(())
    }
}

// ---

/// Subject and body of the alert sent for an anomalous reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyAlert {
    pub subject: String,
    pub message: String,
}

impl AnomalyAlert {
    // ---
    pub fn new(msg: &IngestMessage, thresholds: &ThresholdProfile, evaluation: &Evaluation) -> Self {
        // ---
        let subject = format!(
            "CryoSure ANOMALY: Device {} ({})",
            msg.device_id, thresholds.profile_name
        );

        let message = format!(
            "Anomaly detected for Device: {}\n\
             Profile: {}\n\
             Timestamp: {}\n\
             Temp: {}°C (Range: {}-{}°C)\n\
             Humidity: {}% (Max: {}%)\n\
             Details: {}",
            msg.device_id,
            thresholds.profile_name,
            format_utc(msg.timestamp),
            msg.temperature,
            thresholds.min_temp,
            thresholds.max_temp,
            msg.humidity,
            thresholds.max_humidity,
            evaluation.details.join(", ")
        );

        AnomalyAlert { subject, message }
    }
}

/// Render unix seconds as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Timestamps outside chrono's range are printed as the raw number.
pub fn format_utc(timestamp: Decimal) -> String {
    // ---
    let secs = timestamp.trunc().to_i64();
    let nanos = (timestamp.fract() * Decimal::from(1_000_000_000))
        .to_u32()
        .unwrap_or(0);

    secs.and_then(|s| DateTime::from_timestamp(s, nanos))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{} (unix seconds)", timestamp))
}
