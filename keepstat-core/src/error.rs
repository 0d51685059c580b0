//! Core error types for keepstat.

use thiserror::Error;

/// Configuration rejected before any polling starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The base URL could not be parsed as an absolute URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The base URL does not use http or https.
    #[error("Unsupported URL scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    /// The base URL has no host.
    #[error("URL has no host: {0}")]
    MissingHost(String),

    /// The API token is empty.
    #[error("API token is empty")]
    EmptyToken,

    /// The poll interval is below the minimum.
    #[error("Poll interval {actual}s is below the minimum of {min}s")]
    IntervalTooShort {
        /// Minimum allowed interval in seconds.
        min: u64,
        /// Requested interval in seconds.
        actual: u64,
    },
}
