//! Application entry point for the `cryosure-coldchain` service.
//!
//! Startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the readings and active-profile tables if they do not exist
//! - Mounting the ingest, readings, config and health routes
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL`, `SENSOR_TABLE_NAME`, `CONFIG_TABLE_NAME`,
//!   `ALERT_CHANNEL`, `ALERT_WEBHOOK_URL` (**required**)
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `BIND_ADDR` (optional) – listen address (default: `0.0.0.0:8080`)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! A missing or invalid variable aborts startup with a non-zero exit.
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use cryosure_coldchain::notify::WebhookNotifier;
use cryosure_coldchain::store::PgStore;
use cryosure_coldchain::{config, logging, routes, schema, AppState};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    logging::init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool, &cfg.sensor_table, &cfg.config_table).await?;

    let store = Arc::new(PgStore::new(pool, &cfg.sensor_table, &cfg.config_table));
    let state = AppState {
        readings: store.clone(),
        config: store,
        notifier: Arc::new(WebhookNotifier::new(&cfg.alert_webhook_url, &cfg.alert_channel)),
    };

    let app: Router = routes::router(state);

    tracing::info!("Listening on {}", cfg.bind_addr);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
