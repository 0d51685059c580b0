//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use keepstat_core::{ErrorRecord, HealthStatus, StatsSnapshot, redact};
use keepstat_store::Settings;
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Statistics with the state of the last refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOutput {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthOutput>,
}

/// A failed request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub reason: &'static str,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
    /// Whether the next poll may succeed without a config change.
    pub transient: bool,
}

impl From<&ErrorRecord> for ErrorOutput {
    fn from(record: &ErrorRecord) -> Self {
        Self {
            reason: record.kind.reason_code(),
            message: record.to_string(),
            occurred_at: record.occurred_at,
            transient: record.kind.is_transient(),
        }
    }
}

/// Health endpoint result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOutput {
    pub status_code: u16,
    pub status: String,
    pub problem: bool,
}

impl From<&HealthStatus> for HealthOutput {
    fn from(health: &HealthStatus) -> Self {
        Self {
            status_code: health.status_code,
            status: health.status.clone(),
            problem: health.is_problem(),
        }
    }
}

/// Result of the check command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutput {
    pub url: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_error: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_error: Option<ErrorOutput>,
}

/// Stored settings with the token redacted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOutput {
    pub url: Option<String>,
    pub token: Option<String>,
    pub scan_interval_secs: u64,
}

impl From<&Settings> for SettingsOutput {
    fn from(settings: &Settings) -> Self {
        Self {
            url: settings.url.clone(),
            token: settings.token.as_deref().map(redact),
            scan_interval_secs: settings.scan_interval_secs,
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}
