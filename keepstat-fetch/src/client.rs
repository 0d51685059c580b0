//! Karakeep API client.

use async_trait::async_trait;
use keepstat_core::{ConnectionConfig, HealthStatus, StatsSnapshot};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::error::ClientError;
use crate::fetcher::StatsFetcher;
use crate::host::http::HttpClient;

// ============================================================================
// Constants
// ============================================================================

/// Stats endpoint, relative to the base URL.
pub const STATS_ENDPOINT: &str = "/api/v1/users/me/stats";

/// Health endpoint, relative to the base URL.
pub const HEALTH_ENDPOINT: &str = "/api/health";

// ============================================================================
// API Response Types
// ============================================================================

/// Body of the stats endpoint. Every counter is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    num_bookmarks: u64,
    num_favorites: u64,
    num_archived: u64,
    num_highlights: u64,
    num_lists: u64,
    num_tags: u64,
}

impl From<StatsResponse> for StatsSnapshot {
    fn from(r: StatsResponse) -> Self {
        StatsSnapshot::new(
            r.num_bookmarks,
            r.num_favorites,
            r.num_archived,
            r.num_highlights,
            r.num_lists,
            r.num_tags,
        )
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
}

/// Parses a stats body into a snapshot.
///
/// # Errors
///
/// Returns [`ClientError::InvalidResponse`] if the body is not JSON or any
/// counter is missing, null, negative or not an integer.
pub fn parse_stats(body: &str) -> Result<StatsSnapshot, ClientError> {
    serde_json::from_str::<StatsResponse>(body)
        .map(StatsSnapshot::from)
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

// ============================================================================
// API Client
// ============================================================================

/// Stateless client for the Karakeep REST API.
///
/// Each call takes the [`ConnectionConfig`] to use, so one client can serve
/// a coordinator across reconfigurations.
#[derive(Debug, Clone)]
pub struct KarakeepClient {
    http: HttpClient,
}

impl KarakeepClient {
    /// Creates a client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpClient::new()?,
        })
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpClient::with_timeout(timeout)?,
        })
    }

    /// Fetches the user's statistics.
    ///
    /// # Errors
    ///
    /// See [`ClientError`] for the status and transport mapping.
    #[instrument(skip(self, config), fields(base_url = %config.base_url()))]
    pub async fn get_stats(&self, config: &ConnectionConfig) -> Result<StatsSnapshot, ClientError> {
        let url = config.endpoint(STATS_ENDPOINT);
        debug!(token = %config.redacted_token(), "Fetching stats");

        let response = self
            .http
            .get_with_bearer(&url, config.token())
            .await
            .inspect_err(|e| error!(error = %e, "Stats request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let err = ClientError::from_status(status.as_u16(), &url);
            error!(status = status.as_u16(), error = %err, "Stats request rejected");
            return Err(err);
        }

        let body = self.http.read_text(response).await?;
        let snapshot = parse_stats(&body).inspect_err(|e| {
            warn!(error = %e, "Failed to parse stats response");
        })?;

        debug!(?snapshot, "Stats fetched");
        Ok(snapshot)
    }

    /// Fetches the service health.
    ///
    /// Any HTTP response produces a [`HealthStatus`]; a non-200 code or a
    /// missing `status` field shows up as a problem rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures.
    #[instrument(skip(self, config), fields(base_url = %config.base_url()))]
    pub async fn get_health(&self, config: &ConnectionConfig) -> Result<HealthStatus, ClientError> {
        let url = config.endpoint(HEALTH_ENDPOINT);
        debug!("Fetching health");

        let response = self.http.get_with_bearer(&url, config.token()).await?;
        let status_code = response.status().as_u16();
        let body = self.http.read_text(response).await?;

        let status = serde_json::from_str::<HealthResponse>(&body)
            .ok()
            .and_then(|r| r.status)
            .unwrap_or_else(|| "unknown".to_string());

        let health = HealthStatus::new(status_code, status);
        debug!(status_code, status = %health.status, problem = health.is_problem(), "Health fetched");
        Ok(health)
    }
}

#[async_trait]
impl StatsFetcher for KarakeepClient {
    async fn fetch_stats(&self, config: &ConnectionConfig) -> Result<StatsSnapshot, ClientError> {
        self.get_stats(config).await
    }

    async fn fetch_health(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Option<HealthStatus>, ClientError> {
        self.get_health(config).await.map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================
