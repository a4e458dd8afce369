//! Laserline Engine - headless host for the Laserline gameplay core.
//!
//! This crate provides configuration loading and a fixed-timestep match
//! driver with a scripted autopilot.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod sim;

pub use config::{EngineConfig, CONFIG_FILE, DEFAULT_LOG_FILTER};
pub use sim::{Autopilot, EventTally, MatchReport, Simulation};
