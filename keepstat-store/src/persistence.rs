//! File persistence helpers.
//!
//! Settings hold the API token, so files are written owner-only.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - Linux: `~/.config/keepstat`
/// - macOS: `~/Library/Application Support/keepstat`
/// - Windows: `%APPDATA%\keepstat`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from("."), |c| c.join("keepstat"))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

// ============================================================================
// Permissions
// ============================================================================

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = format!("{mode:o}"), "Set permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Creates `dir` and any missing ancestors, each owner-only.
///
/// Directories that already exist keep their permissions.
async fn create_dir_secure(dir: &Path) -> Result<(), StoreError> {
    let missing: Vec<&Path> = dir.ancestors().take_while(|p| !p.exists()).collect();
    if missing.is_empty() {
        return Ok(());
    }

    debug!(path = %dir.display(), "Creating directory");
    tokio::fs::create_dir_all(dir).await?;
    for created in missing {
        set_mode(created, 0o700).await?;
    }
    Ok(())
}

/// Saves data to a JSON file.
///
/// Creates parent directories as needed, writes through a temp file and a
/// rename, and leaves the file at mode 0600 on Unix.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem step fails.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_secure(parent).await?;
    }

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    set_mode(&temp_path, 0o600).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), "JSON file saved");
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read and
/// [`StoreError::Serialization`] if it is not valid JSON for `T`.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

// ============================================================================
// Tests
// ============================================================================
