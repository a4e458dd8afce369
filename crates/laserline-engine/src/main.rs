//! # Laserline
//!
//! Runs a headless Laserline match and prints the report.
//!
//! Usage: `laserline [config.toml]`. Without an argument the engine reads
//! `laserline.toml` from the working directory.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use laserline_engine::{EngineConfig, Simulation, CONFIG_FILE, DEFAULT_LOG_FILTER};

/// Main entry point.
fn main() -> Result<()> {
    // Install logging before the config is read.
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let startup = EngineConfig::default().log_directive(rust_log.as_deref());
    let filter = EnvFilter::try_new(startup).or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    let (filter, filter_handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = EngineConfig::load_from(&path);

    // RUST_LOG wins over the configured filter.
    let directive = config.log_directive(rust_log.as_deref());
    match EnvFilter::try_new(&directive) {
        Ok(filter) => filter_handle.reload(filter)?,
        Err(e) => warn!("Invalid log filter {directive:?}: {e}"),
    }

    info!("Laserline starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut simulation = Simulation::new(&config)?;
    let report = simulation.run();

    if config.json_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:?} after {:.1}s", report.outcome, report.seconds);
    }

    info!("Laserline shutdown complete");
    Ok(())
}
