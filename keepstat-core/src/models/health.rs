//! Service health types.

use serde::{Deserialize, Serialize};

/// Health reported by the service's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// HTTP status code of the health response.
    pub status_code: u16,
    /// `status` field of the response body, or `"unknown"`.
    pub status: String,
}

impl HealthStatus {
    /// Creates a new health status.
    pub fn new(status_code: u16, status: impl Into<String>) -> Self {
        Self {
            status_code,
            status: status.into(),
        }
    }

    /// Returns true unless the service answered 200 with status `ok`.
    pub fn is_problem(&self) -> bool {
        self.status_code != 200 || !self.status.eq_ignore_ascii_case("ok")
    }
}
