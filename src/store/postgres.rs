//! PostgreSQL backend for both store traits.
//!
//! Table names come from configuration and are validated as plain SQL
//! identifiers before they reach this module, so they are spliced into the
//! statement text while every value is bound.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ConfigStore, ReadingStore, StoredProfile};
use crate::error::Result;
use crate::models::{Reading, ThresholdProfile, ACTIVE_CONFIG_KEY};

// ---

#[derive(Debug, Clone)]
pub struct PgStore {
    // ---
    pool: PgPool,
    sensor_table: String,
    config_table: String,
}

impl PgStore {
    // ---
    pub fn new(pool: PgPool, sensor_table: &str, config_table: &str) -> Self {
        PgStore {
            pool,
            sensor_table: sensor_table.to_string(),
            config_table: config_table.to_string(),
        }
    }
}

#[async_trait]
impl ReadingStore for PgStore {
    // ---
    async fn put_reading(&self, reading: &Reading) -> Result<()> {
        // ---
        let sql = format!(
            r#"
            INSERT INTO {} (
                device_id, timestamp, temperature, humidity,
                applied_profile_name, is_anomaly, anomaly_details
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            self.sensor_table
        );

        sqlx::query(&sql)
            .bind(&reading.device_id)
            .bind(reading.timestamp)
            .bind(reading.temperature)
            .bind(reading.humidity)
            .bind(&reading.applied_profile_name)
            .bind(reading.is_anomaly)
            .bind(&reading.anomaly_details)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>> {
        // ---
        let sql = format!(
            r#"
            SELECT device_id, timestamp, temperature, humidity,
                   applied_profile_name, is_anomaly, anomaly_details
              FROM {}
             ORDER BY timestamp DESC
             LIMIT $1
            "#,
            self.sensor_table
        );

        let rows = sqlx::query_as::<_, Reading>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

#[async_trait]
impl ConfigStore for PgStore {
    // ---
    async fn get_active_profile(&self) -> Result<Option<StoredProfile>> {
        // ---
        let sql = format!(
            r#"
            SELECT active_profile_name, min_temp, max_temp, max_humidity
              FROM {}
             WHERE storage_type = $1
            "#,
            self.config_table
        );

        let row = sqlx::query_as::<_, StoredProfile>(&sql)
            .bind(ACTIVE_CONFIG_KEY)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn put_active_profile(&self, profile: &ThresholdProfile) -> Result<()> {
        // ---
        let sql = format!(
            r#"
            INSERT INTO {} (storage_type, active_profile_name, min_temp, max_temp, max_humidity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (storage_type) DO UPDATE SET
                active_profile_name = EXCLUDED.active_profile_name,
                min_temp            = EXCLUDED.min_temp,
                max_temp            = EXCLUDED.max_temp,
                max_humidity        = EXCLUDED.max_humidity
            "#,
            self.config_table
        );

        sqlx::query(&sql)
            .bind(ACTIVE_CONFIG_KEY)
            .bind(&profile.profile_name)
            .bind(profile.min_temp)
            .bind(profile.max_temp)
            .bind(profile.max_humidity)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
