//! Refresh outcome types.
//!
//! - [`ErrorKind`] - Classification of a failed fetch
//! - [`ErrorRecord`] - A recorded failure with message and time
//! - [`RefreshOutcome`] - Result of one poll cycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::stats::StatsSnapshot;

// ============================================================================
// Error Kind
// ============================================================================

/// Classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum ErrorKind {
    /// The token was rejected (HTTP 401/403).
    Auth,
    /// Connection refused, DNS or TLS failure.
    Connection,
    /// The request did not complete within its timeout.
    Timeout,
    /// The endpoint does not exist (HTTP 404).
    NotFound,
    /// The body could not be parsed into a snapshot.
    InvalidResponse,
    /// Any other non-success status.
    Api(u16),
}

impl ErrorKind {
    /// Short machine-readable code for host-facing messages.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Auth => "invalid_auth",
            Self::Connection => "cannot_connect",
            Self::Timeout => "timeout_error",
            Self::NotFound => "invalid_api_path",
            Self::InvalidResponse => "invalid_response",
            Self::Api(_) => "api_error",
        }
    }

    /// Returns true if retrying later without user action may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection | Self::Timeout => true,
            Self::Api(status) => *status >= 500 || *status == 429,
            Self::Auth | Self::NotFound | Self::InvalidResponse => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "authentication error"),
            Self::Connection => write!(f, "connection error"),
            Self::Timeout => write!(f, "timeout"),
            Self::NotFound => write!(f, "not found"),
            Self::InvalidResponse => write!(f, "invalid response"),
            Self::Api(status) => write!(f, "API error (HTTP {status})"),
        }
    }
}

// ============================================================================
// Error Record
// ============================================================================

/// The most recent failure held by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
    /// When the failure was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    /// Creates a record stamped with the current time.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

// ============================================================================
// Refresh Outcome
// ============================================================================

/// Result of a single poll cycle, handed to every listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RefreshOutcome {
    /// The fetch succeeded and the snapshot was stored.
    Success {
        /// The new snapshot.
        snapshot: StatsSnapshot,
    },
    /// The fetch failed; the previous snapshot was kept.
    Failure {
        /// The recorded failure.
        error: ErrorRecord,
    },
}

impl RefreshOutcome {
    /// Returns true for a successful cycle.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the snapshot of a successful cycle.
    pub fn snapshot(&self) -> Option<&StatsSnapshot> {
        match self {
            Self::Success { snapshot } => Some(snapshot),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the error of a failed cycle.
    pub fn error(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}

impl From<StatsSnapshot> for RefreshOutcome {
    fn from(snapshot: StatsSnapshot) -> Self {
        Self::Success { snapshot }
    }
}

impl From<ErrorRecord> for RefreshOutcome {
    fn from(error: ErrorRecord) -> Self {
        Self::Failure { error }
    }
}
