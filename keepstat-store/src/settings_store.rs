//! Stored connection settings.
//!
//! The CLI keeps the server URL, the API token and the poll interval in a
//! JSON file so they do not need to be passed on every run.

use keepstat_core::{ConnectionConfig, DEFAULT_POLL_INTERVAL_SECS, redact};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

// ============================================================================
// Settings
// ============================================================================

/// Persisted connection settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Karakeep base URL.
    pub url: Option<String>,

    /// API token.
    pub token: Option<String>,

    /// Poll interval in seconds.
    pub scan_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            scan_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("token", &self.token.as_deref().map(redact))
            .field("scan_interval_secs", &self.scan_interval_secs)
            .finish()
    }
}

impl Settings {
    /// Builds a validated connection config.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingSetting`] if the URL or token is unset,
    /// or [`StoreError::Config`] if the values do not validate.
    pub fn connection_config(&self) -> Result<ConnectionConfig, StoreError> {
        let url = self.url.as_deref().ok_or(StoreError::MissingSetting("url"))?;
        let token = self
            .token
            .as_deref()
            .ok_or(StoreError::MissingSetting("token"))?;
        Ok(ConnectionConfig::new(url, token, self.scan_interval_secs)?)
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Settings with their backing file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from `path`.
    ///
    /// A missing file yields defaults. A corrupt file also yields defaults,
    /// with a warning, so `config set` can repair it.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            match load_json(&path).await {
                Ok(settings) => settings,
                Err(StoreError::Serialization(e)) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Settings::default()
                }
                Err(e) => return Err(e),
            }
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Applies `f` to the in-memory settings. Call [`save`] to persist.
    ///
    /// [`save`]: SettingsStore::save
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
        debug!(settings = ?*settings, "Settings updated");
    }

    /// Restores defaults in memory.
    pub async fn reset(&self) {
        *self.settings.write().await = Settings::default();
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
