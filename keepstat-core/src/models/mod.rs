//! Domain models for keepstat.
//!
//! ## Submodules
//!
//! - [`stats`] - Counters snapshot and named readings
//! - [`outcome`] - Per-cycle outcomes and error records
//! - [`health`] - Service health status

mod health;
mod outcome;
mod stats;

pub use health::HealthStatus;
pub use outcome::{ErrorKind, ErrorRecord, RefreshOutcome};
pub use stats::{StatKind, StatsSnapshot};
