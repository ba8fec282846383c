//! In-process store used by the test suite.
//!
//! Dependency failures can be switched on to exercise the fail-open config
//! read and the fail-closed writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ConfigStore, ReadingStore, StoredProfile};
use crate::error::{ColdChainError, Result};
use crate::models::{Reading, ThresholdProfile};

// ---

#[derive(Debug, Default)]
pub struct MemoryStore {
    // ---
    readings: Mutex<Vec<Reading>>,
    profile: Mutex<Option<StoredProfile>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the backend were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Store a raw record, including partially populated ones.
    pub fn set_stored_profile(&self, stored: StoredProfile) {
        *lock(&self.profile) = Some(stored);
    }

    pub fn stored_profile(&self) -> Option<StoredProfile> {
        lock(&self.profile).clone()
    }

    /// All readings in insertion order.
    pub fn readings(&self) -> Vec<Reading> {
        lock(&self.readings).clone()
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ColdChainError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ReadingStore for MemoryStore {
    // ---
    async fn put_reading(&self, reading: &Reading) -> Result<()> {
        self.check()?;
        lock(&self.readings).push(reading.clone());
        Ok(())
    }

    async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>> {
        // ---
        self.check()?;
        let mut rows = lock(&self.readings).clone();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    // ---
    async fn get_active_profile(&self) -> Result<Option<StoredProfile>> {
        self.check()?;
        Ok(lock(&self.profile).clone())
    }

    async fn put_active_profile(&self, profile: &ThresholdProfile) -> Result<()> {
        self.check()?;
        *lock(&self.profile) = Some(StoredProfile::from(profile));
        Ok(())
    }
}
