// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # keepstat Core
//!
//! Core types and configuration shared by all keepstat crates.
//!
//! ## Key Types
//!
//! ### Readings
//! - [`StatsSnapshot`] - The six counters from the stats endpoint
//! - [`StatKind`] - One named reading with display name and icon
//!
//! ### Outcomes
//! - [`RefreshOutcome`] - Result of one poll cycle
//! - [`ErrorRecord`] - A recorded failure
//! - [`ErrorKind`] - Failure classification
//! - [`HealthStatus`] - Service health endpoint result
//!
//! ### Configuration
//! - [`ConnectionConfig`] - Validated base URL, token and poll interval
//! - [`ConfigError`] - Rejected configuration

pub mod config;
pub mod error;
pub mod models;

pub use config::{
    redact, ConnectionConfig, DEFAULT_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS,
};
pub use error::ConfigError;
pub use models::{
    ErrorKind, ErrorRecord, HealthStatus, RefreshOutcome, StatKind, StatsSnapshot,
};
