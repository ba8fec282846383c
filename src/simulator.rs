//! Synthetic cold-chain sensor.
//!
//! Produces one reading per tick, normal or anomalous according to the
//! configured probability, and publishes it to the ingest endpoint. The
//! interval is fixed; a slow or failing receiver never slows the sensor down.

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::config::{Range, SimulatorConfig, HUMIDITY_NORMAL_MIN};

// ---

/// What a generated reading is meant to exercise downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Normal,
    HighTemperature,
    LowTemperature,
    HighHumidity,
}

/// Wire format shared with the ingest route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorMessage {
    // ---
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: i64,
}

/// Build one reading for `timestamp` using `rng`.
pub fn generate<R: Rng + ?Sized>(
    cfg: &SimulatorConfig,
    rng: &mut R,
    timestamp: i64,
) -> (ReadingKind, SensorMessage) {
    // ---
    let humidity_normal = Range {
        min: HUMIDITY_NORMAL_MIN,
        max: cfg.humidity_normal_max,
    };

    let kind = if rng.gen::<f64>() < cfg.anomaly_probability {
        match rng.gen_range(0..3) {
            0 => ReadingKind::HighTemperature,
            1 => ReadingKind::LowTemperature,
            _ => ReadingKind::HighHumidity,
        }
    } else {
        ReadingKind::Normal
    };

    let (temperature, humidity) = match kind {
        ReadingKind::Normal => (sample(rng, cfg.temp_normal), sample(rng, humidity_normal)),
        ReadingKind::HighTemperature => (
            sample(rng, cfg.temp_anomaly_high),
            sample(rng, humidity_normal),
        ),
        ReadingKind::LowTemperature => (
            sample(rng, cfg.temp_anomaly_low),
            sample(rng, humidity_normal),
        ),
        ReadingKind::HighHumidity => (
            sample(rng, cfg.temp_normal),
            sample(rng, cfg.humidity_anomaly_high),
        ),
    };

    let message = SensorMessage {
        device_id: cfg.thing_name.clone(),
        temperature,
        humidity,
        timestamp,
    };
    (kind, message)
}

/// Uniform sample from `range`, rounded to two decimals.
fn sample<R: Rng + ?Sized>(rng: &mut R, range: Range) -> f64 {
    let x = rng.gen_range(range.min..=range.max);
    (x * 100.0).round() / 100.0
}

// ---

/// Publishes readings to the ingest endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpPublisher {
    // ---
    /// Requests still unanswered after `timeout` are abandoned.
    pub fn new(url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpPublisher {
            client,
            url: url.to_string(),
        })
    }

    pub async fn publish(&self, message: &SensorMessage) -> reqwest::Result<()> {
        self.client
            .post(&self.url)
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Publish readings on a fixed interval until Ctrl-C.
pub async fn run(cfg: SimulatorConfig) -> anyhow::Result<()> {
    // ---
    let ticks = run_until(&cfg, tokio::signal::ctrl_c()).await?;
    info!("Simulation stopped by user (Ctrl+C detected) after {} readings", ticks);
    Ok(())
}

/// Publish one reading per tick until `shutdown` resolves; returns the tick count.
///
/// Each publish runs on its own task, bounded by the interval, so the ticker
/// never waits on the receiver.
pub async fn run_until<F: Future>(cfg: &SimulatorConfig, shutdown: F) -> reqwest::Result<u64> {
    // ---
    let interval = Duration::from_secs(u64::from(cfg.publish_interval_secs));
    let publisher = HttpPublisher::new(&cfg.ingest_url, interval)?;
    let mut rng = StdRng::from_entropy();

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                ticks += 1;
                let (kind, message) = generate(cfg, &mut rng, chrono::Utc::now().timestamp());
                info!("Simulating {:?} conditions for {}", kind, cfg.thing_name);

                let publisher = publisher.clone();
                tokio::spawn(async move {
                    match publisher.publish(&message).await {
                        Ok(()) => info!(
                            "Published reading to {}: {}°C, {}%, ts={}",
                            publisher.url, message.temperature, message.humidity, message.timestamp
                        ),
                        Err(e) => error!("Failed to publish reading: {}", e),
                    }
                });
            }
        }
    }

    Ok(ticks)
}
