//! Simulated cold-chain sensor.
//!
//! Publishes a synthetic temperature/humidity reading to the service's
//! `/ingest` route every `PUBLISH_INTERVAL_SECONDS` until interrupted. See
//! `config::load_simulator_from_env` for the full variable list.
use anyhow::Result;
use dotenvy::dotenv;

use cryosure_coldchain::{config, logging, simulator};

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    logging::init_tracing();

    let cfg = config::load_simulator_from_env()?;
    cfg.log_config();

    simulator::run(cfg).await?;

    tracing::info!("Simulator shut down");
    Ok(())
}
