//! Storage boundary for readings and the active threshold profile.
//!
//! Handlers only see the [`ReadingStore`] and [`ConfigStore`] traits. The
//! production backend is PostgreSQL (`postgres.rs`); `memory.rs` backs the
//! test suite.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{Reading, ThresholdProfile};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ---

/// Append-only sink and bounded recent-window source for readings.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    // ---
    async fn put_reading(&self, reading: &Reading) -> Result<()>;

    /// Up to `limit` readings across all devices, newest timestamp first.
    async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>>;
}

/// Single-record store addressed by the active-profile sentinel key.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    // ---
    /// `Ok(None)` when no profile has ever been written.
    async fn get_active_profile(&self) -> Result<Option<StoredProfile>>;

    /// Overwrite the active profile in place.
    async fn put_active_profile(&self, profile: &ThresholdProfile) -> Result<()>;
}

/// The active-profile record as stored; any column may be unset.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct StoredProfile {
    // ---
    pub active_profile_name: Option<String>,
    pub min_temp: Option<Decimal>,
    pub max_temp: Option<Decimal>,
    pub max_humidity: Option<Decimal>,
}

impl StoredProfile {
    // ---
    /// Fill unset columns from the compiled-in defaults, field by field.
    pub fn resolve(self) -> ThresholdProfile {
        // ---
        let defaults = ThresholdProfile::default();
        ThresholdProfile {
            profile_name: self.active_profile_name.unwrap_or(defaults.profile_name),
            min_temp: self.min_temp.unwrap_or(defaults.min_temp),
            max_temp: self.max_temp.unwrap_or(defaults.max_temp),
            max_humidity: self.max_humidity.unwrap_or(defaults.max_humidity),
        }
    }
}

impl From<&ThresholdProfile> for StoredProfile {
    fn from(profile: &ThresholdProfile) -> Self {
        StoredProfile {
            active_profile_name: Some(profile.profile_name.clone()),
            min_temp: Some(profile.min_temp),
            max_temp: Some(profile.max_temp),
            max_humidity: Some(profile.max_humidity),
        }
    }
}
