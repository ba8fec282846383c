//! Resolution of the currently active threshold profile.
//!
//! Reads are fail-open: a missing record or an unreachable config store both
//! yield the compiled-in default, so ingestion keeps evaluating readings.
//! Writes to the same record are fail-closed and live in the config route.

use tracing::{debug, info, warn};

use crate::models::{ThresholdProfile, ACTIVE_CONFIG_KEY};
use crate::store::ConfigStore;

// ---

/// Return the active profile, or the default one. Never fails.
pub async fn active_thresholds(store: &dyn ConfigStore) -> ThresholdProfile {
    // ---
    match store.get_active_profile().await {
        Ok(Some(stored)) => {
            debug!("Fetched active config: {:?}", stored);
            stored.resolve()
        }
        Ok(None) => {
            info!(
                "No active config item found ('{}'). Using internal defaults.",
                ACTIVE_CONFIG_KEY
            );
            ThresholdProfile::default()
        }
        Err(e) => {
            warn!("Failed to fetch active config: {}. Using internal defaults.", e);
            ThresholdProfile::default()
        }
    }
}
