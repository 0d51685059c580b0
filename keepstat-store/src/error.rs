//! Store error types.

use keepstat_core::ConfigError;
use thiserror::Error;

/// Errors returned by coordinator lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// `start` was called on a running coordinator.
    #[error("Coordinator is already running")]
    AlreadyRunning,

    /// The coordinator was stopped; no further cycles run.
    #[error("Coordinator is stopped")]
    Stopped,

    /// `start` was called outside a Tokio runtime.
    #[error("No Tokio runtime available to drive the poll timer")]
    NoRuntime,
}

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored settings do not form a valid connection config.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required setting is missing.
    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),
}
