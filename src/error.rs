//! Request-path error taxonomy.
//!
//! Startup failures stay on `anyhow` (see `config.rs`); everything that can go
//! wrong while serving a single request is a [`ColdChainError`], translated
//! into a structured response at the route boundary.

use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum ColdChainError {
    // ---
    /// One or more required input fields were absent, null or empty.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field was present but could not be read as an exact decimal.
    #[error("invalid decimal value for {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("notification error: {0}")]
    Notify(#[from] reqwest::Error),

    /// A dependency refused the call without a driver-level error.
    #[error("dependency unavailable: {0}")]
    Unavailable(String),
}

impl ColdChainError {
    // ---
    /// True for errors caused by the caller's input rather than a dependency.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ColdChainError::MissingFields(_) | ColdChainError::InvalidNumber { .. }
        )
    }
}

pub type Result<T, E = ColdChainError> = std::result::Result<T, E>;
