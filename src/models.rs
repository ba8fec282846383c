//! Data models for the cold-chain pipeline.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ColdChainError, Result};

// ---

/// Sentinel key addressing the single active-profile record.
pub const ACTIVE_CONFIG_KEY: &str = "CURRENT_ACTIVE_THRESHOLDS";

/// Profile name reported when no active profile has been stored.
pub const DEFAULT_PROFILE_NAME: &str = "Default (No Config Set)";

/// Placeholder detail recorded for readings inside every bound.
pub const NO_ANOMALY: &str = "No anomaly";

/// The currently effective alert thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdProfile {
    // ---
    pub profile_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_temp: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_temp: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_humidity: Decimal,
}

impl ThresholdProfile {
    // ---
    pub fn default_min_temp() -> Decimal {
        Decimal::new(20, 1)
    }

    pub fn default_max_temp() -> Decimal {
        Decimal::new(80, 1)
    }

    pub fn default_max_humidity() -> Decimal {
        Decimal::new(850, 1)
    }
}

/// 2.0–8.0°C, at most 85.0% humidity.
impl Default for ThresholdProfile {
    fn default() -> Self {
        ThresholdProfile {
            profile_name: DEFAULT_PROFILE_NAME.to_string(),
            min_temp: Self::default_min_temp(),
            max_temp: Self::default_max_temp(),
            max_humidity: Self::default_max_humidity(),
        }
    }
}

/// A persisted, evaluated sensor reading.
///
/// Decimals are stored exactly; on the wire they are rendered as JSON numbers,
/// which is lossy but what the dashboard expects.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    // ---
    pub device_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub timestamp: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub temperature: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub humidity: Decimal,
    pub applied_profile_name: String,
    pub is_anomaly: bool,
    pub anomaly_details: Vec<String>,
}

/// A telemetry message that passed presence checks and numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestMessage {
    // ---
    pub device_id: String,
    pub temperature: Decimal,
    pub humidity: Decimal,
    pub timestamp: Decimal,
}

impl IngestMessage {
    // ---
    /// Validate an inbound `{deviceId, temperature, humidity, timestamp}` payload.
    ///
    /// Presence is checked for all four fields before any coercion, so a
    /// message that is both incomplete and malformed reports the missing fields.
    pub fn from_json(event: &Value) -> Result<Self> {
        // ---
        let device_id = non_empty_str(event.get("deviceId"));
        let temperature = present(event.get("temperature"));
        let humidity = present(event.get("humidity"));
        let timestamp = present(event.get("timestamp"));

        let mut missing = Vec::new();
        if device_id.is_none() {
            missing.push("deviceId");
        }
        if temperature.is_none() {
            missing.push("temperature");
        }
        if humidity.is_none() {
            missing.push("humidity");
        }
        if timestamp.is_none() {
            missing.push("timestamp");
        }

        match (device_id, temperature, humidity, timestamp) {
            (Some(device_id), Some(t), Some(h), Some(ts)) => Ok(IngestMessage {
                device_id: device_id.to_string(),
                temperature: parse_decimal("temperature", t)?,
                humidity: parse_decimal("humidity", h)?,
                timestamp: parse_decimal("timestamp", ts)?,
            }),
            _ => Err(ColdChainError::MissingFields(missing)),
        }
    }
}

/// A request to replace the active threshold profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    // ---
    pub profile_name: String,
    pub min_temp: Decimal,
    pub max_temp: Decimal,
    pub max_humidity: Decimal,
}

impl ConfigUpdate {
    // ---
    /// Validate an inbound `{storageType, minTemp, maxTemp, maxHumidity}` body.
    ///
    /// No ordering check is made between `minTemp` and `maxTemp`.
    pub fn from_json(body: &Value) -> Result<Self> {
        // ---
        let profile_name = non_empty_str(body.get("storageType"));
        let min_temp = present(body.get("minTemp"));
        let max_temp = present(body.get("maxTemp"));
        let max_humidity = present(body.get("maxHumidity"));

        let mut missing = Vec::new();
        if profile_name.is_none() {
            missing.push("storageType");
        }
        if min_temp.is_none() {
            missing.push("minTemp");
        }
        if max_temp.is_none() {
            missing.push("maxTemp");
        }
        if max_humidity.is_none() {
            missing.push("maxHumidity");
        }

        match (profile_name, min_temp, max_temp, max_humidity) {
            (Some(name), Some(min), Some(max), Some(hum)) => Ok(ConfigUpdate {
                profile_name: name.to_string(),
                min_temp: parse_decimal("minTemp", min)?,
                max_temp: parse_decimal("maxTemp", max)?,
                max_humidity: parse_decimal("maxHumidity", hum)?,
            }),
            _ => Err(ColdChainError::MissingFields(missing)),
        }
    }
}

impl From<ConfigUpdate> for ThresholdProfile {
    fn from(update: ConfigUpdate) -> Self {
        ThresholdProfile {
            profile_name: update.profile_name,
            min_temp: update.min_temp,
            max_temp: update.max_temp,
            max_humidity: update.max_humidity,
        }
    }
}

// ---

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Coerce a JSON number or numeric string into an exact decimal.
///
/// Numbers go through their textual form so `10.0` keeps its scale. A JSON
/// number whose exponent is beyond decimal scale is taken from its `f64`
/// value, rounded to the nearest representable decimal.
pub fn parse_decimal(field: &'static str, value: &Value) -> Result<Decimal> {
    // ---
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    let parsed = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| match value {
            Value::Number(n) => n.as_f64().and_then(Decimal::from_f64_retain),
            _ => None,
        });

    parsed.ok_or(ColdChainError::InvalidNumber { field, value: text })
}
