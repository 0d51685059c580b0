//! Stats fetcher trait.
//!
//! The coordinator depends on this seam rather than on [`KarakeepClient`]
//! directly, so scheduling can be exercised without a live service.
//!
//! [`KarakeepClient`]: crate::client::KarakeepClient

use async_trait::async_trait;
use keepstat_core::{ConnectionConfig, HealthStatus, StatsSnapshot};
use std::sync::Arc;

use crate::error::ClientError;

/// Something that can fetch one stats snapshot.
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    /// Fetches the current counters using `config`.
    ///
    /// Implementations must not retry; retry policy belongs to the caller.
    async fn fetch_stats(&self, config: &ConnectionConfig) -> Result<StatsSnapshot, ClientError>;

    /// Fetches the service health alongside the stats.
    ///
    /// `Ok(None)` means the fetcher has no health source.
    async fn fetch_health(
        &self,
        _config: &ConnectionConfig,
    ) -> Result<Option<HealthStatus>, ClientError> {
        Ok(None)
    }
}

#[async_trait]
impl<T: StatsFetcher + ?Sized> StatsFetcher for Arc<T> {
    async fn fetch_stats(&self, config: &ConnectionConfig) -> Result<StatsSnapshot, ClientError> {
        (**self).fetch_stats(config).await
    }

    async fn fetch_health(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Option<HealthStatus>, ClientError> {
        (**self).fetch_health(config).await
    }
}
