//! Fetch error types.

use keepstat_core::{ErrorKind, ErrorRecord};
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;

/// Error returned by the API client.
///
/// The client never retries; every variant is surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The token was rejected.
    #[error("Authentication failed (HTTP {0})")]
    Auth(u16),

    /// Connection refused, DNS or TLS failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint not found.
    #[error("Endpoint not found: {0}")]
    NotFound(String),

    /// Body could not be parsed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Any other non-success status.
    #[error("API returned HTTP {0}")]
    Api(u16),
}

impl ClientError {
    /// Returns the classification stored in error records.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
            Self::Api(status) => ErrorKind::Api(*status),
        }
    }

    /// Builds the record the coordinator keeps as its last error.
    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord::new(self.kind(), self.to_string())
    }

    /// Classifies a transport-level reqwest error.
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::Timeout(timeout);
        }
        if err.is_decode() {
            return Self::InvalidResponse(err.to_string());
        }
        let message = match err.source() {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        };
        Self::Connection(message)
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, url: &str) -> Self {
        match status {
            401 | 403 => Self::Auth(status),
            404 => Self::NotFound(url.to_string()),
            _ => Self::Api(status),
        }
    }
}

impl From<&ClientError> for ErrorRecord {
    fn from(err: &ClientError) -> Self {
        err.to_record()
    }
}
