//! Cold-chain monitoring: telemetry ingestion with threshold alerting, a
//! recent-readings query, active-profile configuration, and a sensor
//! simulator that feeds the ingest route.
//!
//! Module boundaries:
//! - `models`, `evaluator` – pure data and threshold rules
//! - `active_profile` – fail-open resolution of the active profile
//! - `store`, `schema`, `notify` – external dependencies behind traits
//! - `routes` – the HTTP surface and its error translation
//! - `config`, `logging` – startup concerns shared by both binaries

pub mod active_profile;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod models;
pub mod notify;
pub mod routes;
pub mod schema;
pub mod simulator;
pub mod store;

pub use config::{Config, SimulatorConfig};
pub use error::ColdChainError;
pub use models::{Reading, ThresholdProfile};
pub use routes::AppState;
