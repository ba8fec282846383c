//! Database schema management for `cryosure-coldchain`.
//!
//! Ensures the readings and active-profile tables exist before serving
//! requests. Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the schema if it does not exist (idempotent).
///
/// `sensor_table` receives one row per ingested reading; `config_table` holds
/// at most one row, keyed by the active-profile sentinel. Both names must
/// already have passed `config::validate_table_name`.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool, sensor_table: &str, config_table: &str) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Append-only readings; (device_id, timestamp) is not unique
    let readings = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {sensor_table} (
            id                   BIGSERIAL PRIMARY KEY,
            device_id            TEXT      NOT NULL,
            timestamp            NUMERIC   NOT NULL,
            temperature          NUMERIC   NOT NULL,
            humidity             NUMERIC   NOT NULL,
            applied_profile_name TEXT      NOT NULL,
            is_anomaly           BOOLEAN   NOT NULL,
            anomaly_details      TEXT[]    NOT NULL
        );
        "#
    );
    sqlx::query(&readings).execute(&mut *tx).await?;

    // Columns are nullable; readers fill gaps from the default profile
    let config = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {config_table} (
            storage_type        TEXT PRIMARY KEY,
            active_profile_name TEXT,
            min_temp            NUMERIC,
            max_temp            NUMERIC,
            max_humidity        NUMERIC
        );
        "#
    );
    sqlx::query(&config).execute(&mut *tx).await?;

    let index = format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{sensor_table}_device_ts
            ON {sensor_table} (device_id, timestamp);
        "#
    );
    sqlx::query(&index).execute(&mut *tx).await?;

    let recent = format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{sensor_table}_ts
            ON {sensor_table} (timestamp DESC);
        "#
    );
    sqlx::query(&recent).execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(())
}
