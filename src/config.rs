//! Configuration loader for the cold-chain service and the sensor simulator.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Anything missing or invalid is fatal at startup;
//! nothing here is consulted per request.
use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, bail, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional floating point environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed service configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Table holding ingested sensor readings.
    pub sensor_table: String,

    /// Table holding the single active threshold profile.
    pub config_table: String,

    /// Fixed channel identifier every anomaly alert is published to.
    pub alert_channel: String,

    /// Webhook endpoint that delivers alerts for `alert_channel`.
    pub alert_webhook_url: String,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
}

/// Load service configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
/// - `SENSOR_TABLE_NAME` – readings table
/// - `CONFIG_TABLE_NAME` – active-profile table
/// - `ALERT_CHANNEL` – alert channel identifier
/// - `ALERT_WEBHOOK_URL` – alert delivery endpoint
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let sensor_table = require_env!("SENSOR_TABLE_NAME");
    let config_table = require_env!("CONFIG_TABLE_NAME");
    let alert_channel = require_env!("ALERT_CHANNEL");
    let alert_webhook_url = require_env!("ALERT_WEBHOOK_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let bind_addr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

    validate_table_name("SENSOR_TABLE_NAME", &sensor_table)?;
    validate_table_name("CONFIG_TABLE_NAME", &config_table)?;

    Ok(Config {
        db_url,
        db_pool_max,
        sensor_table,
        config_table,
        alert_channel,
        alert_webhook_url,
        bind_addr,
    })
}

/// Table names are spliced into SQL text, so only plain identifiers pass.
pub fn validate_table_name(var_name: &str, name: &str) -> Result<()> {
    // ---
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid || name.len() > 63 {
        bail!("Invalid {}: '{}' is not a plain SQL identifier", var_name, name);
    }
    Ok(())
}

/// Mask the password portion of a connection URL.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
        }
    }
    db_url.to_string()
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL      : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX       : {}", self.db_pool_max);
        tracing::info!("  SENSOR_TABLE_NAME : {}", self.sensor_table);
        tracing::info!("  CONFIG_TABLE_NAME : {}", self.config_table);
        tracing::info!("  ALERT_CHANNEL     : {}", self.alert_channel);
        tracing::info!("  ALERT_WEBHOOK_URL : {}", self.alert_webhook_url);
        tracing::info!("  BIND_ADDR         : {}", self.bind_addr);
    }
}

// ---

/// Inclusive `[min, max]` range used for sampling simulated values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    // ---
    fn checked(name: &str, min: f64, max: f64) -> Result<Range> {
        if !(min.is_finite() && max.is_finite()) || min > max {
            bail!("Invalid {} range: {}..{}", name, min, max);
        }
        Ok(Range { min, max })
    }
}

/// Sensor simulator configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    // ---
    /// Endpoint readings are published to.
    pub ingest_url: String,

    /// Device identifier stamped on every reading.
    pub thing_name: String,

    pub publish_interval_secs: u32,

    /// Chance in `[0, 1]` that a reading is an anomaly.
    pub anomaly_probability: f64,

    pub temp_normal: Range,
    pub humidity_normal_max: f64,
    pub temp_anomaly_low: Range,
    pub temp_anomaly_high: Range,
    pub humidity_anomaly_high: Range,
}

/// Lower bound of humidity for readings that are not humidity anomalies.
pub const HUMIDITY_NORMAL_MIN: f64 = 30.0;

/// Load simulator configuration from environment variables with defaults.
///
/// Required:
/// - `INGEST_URL` – where readings are POSTed
/// - `THING_NAME` – simulated device id
///
/// Optional (defaults in parentheses):
/// - `PUBLISH_INTERVAL_SECONDS` (5), `ANOMALY_PROBABILITY` (0.15)
/// - `TEMP_NORMAL_MIN` / `TEMP_NORMAL_MAX` (2.0 / 8.0)
/// - `HUMIDITY_NORMAL_MAX` (85.0)
/// - `TEMP_ANOMALY_RANGE_LOW_MIN` / `_MAX` (-5.0 / 1.0)
/// - `TEMP_ANOMALY_RANGE_HIGH_MIN` / `_MAX` (9.0 / 15.0)
/// - `HUMIDITY_ANOMALY_RANGE_HIGH_MIN` / `_MAX` (88.0 / 99.0)
pub fn load_simulator_from_env() -> Result<SimulatorConfig> {
    // ---
    let ingest_url = require_env!("INGEST_URL");
    let thing_name = require_env!("THING_NAME");
    let publish_interval_secs = parse_env_u32!("PUBLISH_INTERVAL_SECONDS", 5);
    let anomaly_probability = parse_env_f64!("ANOMALY_PROBABILITY", 0.15);

    if !(0.0..=1.0).contains(&anomaly_probability) {
        bail!("Invalid ANOMALY_PROBABILITY: {} is not within [0, 1]", anomaly_probability);
    }
    if publish_interval_secs == 0 {
        bail!("Invalid PUBLISH_INTERVAL_SECONDS: must be at least 1");
    }

    let temp_normal = Range::checked(
        "TEMP_NORMAL",
        parse_env_f64!("TEMP_NORMAL_MIN", 2.0),
        parse_env_f64!("TEMP_NORMAL_MAX", 8.0),
    )?;
    let humidity_normal_max = parse_env_f64!("HUMIDITY_NORMAL_MAX", 85.0);
    Range::checked("HUMIDITY_NORMAL", HUMIDITY_NORMAL_MIN, humidity_normal_max)?;

    let temp_anomaly_low = Range::checked(
        "TEMP_ANOMALY_RANGE_LOW",
        parse_env_f64!("TEMP_ANOMALY_RANGE_LOW_MIN", -5.0),
        parse_env_f64!("TEMP_ANOMALY_RANGE_LOW_MAX", 1.0),
    )?;
    let temp_anomaly_high = Range::checked(
        "TEMP_ANOMALY_RANGE_HIGH",
        parse_env_f64!("TEMP_ANOMALY_RANGE_HIGH_MIN", 9.0),
        parse_env_f64!("TEMP_ANOMALY_RANGE_HIGH_MAX", 15.0),
    )?;
    let humidity_anomaly_high = Range::checked(
        "HUMIDITY_ANOMALY_RANGE_HIGH",
        parse_env_f64!("HUMIDITY_ANOMALY_RANGE_HIGH_MIN", 88.0),
        parse_env_f64!("HUMIDITY_ANOMALY_RANGE_HIGH_MAX", 99.0),
    )?;

    Ok(SimulatorConfig {
        ingest_url,
        thing_name,
        publish_interval_secs,
        anomaly_probability,
        temp_normal,
        humidity_normal_max,
        temp_anomaly_low,
        temp_anomaly_high,
        humidity_anomaly_high,
    })
}

impl SimulatorConfig {
    /// Log the loaded simulator configuration.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Simulator configuration loaded:");
        tracing::info!("  INGEST_URL               : {}", self.ingest_url);
        tracing::info!("  THING_NAME               : {}", self.thing_name);
        tracing::info!("  PUBLISH_INTERVAL_SECONDS : {}", self.publish_interval_secs);
        tracing::info!("  ANOMALY_PROBABILITY      : {}", self.anomaly_probability);
        tracing::info!(
            "  TEMP_NORMAL              : {}..{}",
            self.temp_normal.min,
            self.temp_normal.max
        );
        tracing::info!("  HUMIDITY_NORMAL_MAX      : {}", self.humidity_normal_max);
    }
}
