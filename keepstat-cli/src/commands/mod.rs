//! CLI command implementations.

pub mod check;
pub mod config;
pub mod stats;
pub mod watch;

use anyhow::Result;
use keepstat_core::ConnectionConfig;
use keepstat_fetch::KarakeepClient;
use keepstat_store::{Settings, SettingsStore, StoreError, UpdateCoordinator};
use std::sync::Arc;
use tracing::debug;

use crate::Cli;

/// A required connection setting was not given anywhere.
#[derive(Debug, thiserror::Error)]
#[error(
    "no {0} configured; pass --{0}, set KEEPSTAT_{upper}, or run `keepstat config set --{0} ...`",
    upper = .0.to_uppercase()
)]
pub struct MissingConfig(pub &'static str);

/// Layers command-line and environment values over stored settings.
pub fn apply_overrides(
    mut settings: Settings,
    url: Option<&str>,
    token: Option<&str>,
    interval: Option<u64>,
) -> Settings {
    if let Some(url) = url {
        settings.url = Some(url.to_string());
    }
    if let Some(token) = token {
        settings.token = Some(token.to_string());
    }
    if let Some(interval) = interval {
        settings.scan_interval_secs = interval;
    }
    settings
}

/// Resolves the effective connection config.
pub async fn resolve_config(cli: &Cli) -> Result<ConnectionConfig> {
    let store = SettingsStore::load_default().await?;
    let settings = apply_overrides(
        store.get().await,
        cli.url.as_deref(),
        cli.token.as_deref(),
        cli.interval,
    );

    let config = match settings.connection_config() {
        Ok(config) => config,
        Err(StoreError::MissingSetting(name)) => return Err(MissingConfig(name).into()),
        Err(e) => return Err(e.into()),
    };
    debug!(?config, "Resolved connection config");
    Ok(config)
}

/// Builds a coordinator backed by the HTTP client.
pub fn build_coordinator(config: ConnectionConfig) -> Result<UpdateCoordinator> {
    let client = KarakeepClient::new()?;
    Ok(UpdateCoordinator::new(config, Arc::new(client))?)
}
