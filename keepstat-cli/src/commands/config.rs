//! Config command - manage stored settings.

use anyhow::Result;
use clap::{Args, Subcommand};
use keepstat_core::redact;
use keepstat_store::{SettingsStore, StoreError, default_config_dir, default_settings_path};
use tracing::info;

use crate::output::{JsonFormatter, SettingsOutput};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show stored settings (token redacted).
    Show,

    /// Show configuration paths.
    Path,

    /// Update stored settings.
    Set {
        /// Karakeep base URL.
        #[arg(long)]
        url: Option<String>,

        /// API token.
        #[arg(long)]
        token: Option<String>,

        /// Poll interval in seconds (minimum 30).
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Restore default settings.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Set {
            url,
            token,
            interval,
        } => set_config(url.as_deref(), token.as_deref(), *interval).await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("keepstat Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("URL:      {}", settings.url.as_deref().unwrap_or("(not set)"));
            println!(
                "Token:    {}",
                settings
                    .token
                    .as_deref()
                    .map_or_else(|| "(not set)".to_string(), redact)
            );
            println!("Interval: {}s", settings.scan_interval_secs);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&SettingsOutput::from(&settings))?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "configDir": config_dir.display().to_string(),
                "settingsFile": settings_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_config(url: Option<&str>, token: Option<&str>, interval: Option<u64>) -> Result<()> {
    if url.is_none() && token.is_none() && interval.is_none() {
        anyhow::bail!("Nothing to set. Use --url, --token or --interval");
    }

    let store = SettingsStore::load_default().await?;
    let candidate = super::apply_overrides(store.get().await, url, token, interval);

    // Partial settings are fine; values that are present must validate.
    match candidate.connection_config() {
        Ok(_) | Err(StoreError::MissingSetting(_)) => {}
        Err(e) => return Err(e.into()),
    }

    store.update(|s| *s = candidate).await;
    store.save().await?;

    info!(path = %store.path().display(), "Settings updated");
    println!("Settings saved to {}", store.path().display());
    Ok(())
}

async fn reset_config() -> Result<()> {
    let store = SettingsStore::load_default().await?;
    reset_settings(&store).await?;
    println!("Configuration reset to defaults");
    Ok(())
}

/// Writes default settings over the stored ones.
async fn reset_settings(store: &SettingsStore) -> Result<()> {
    store.reset().await;
    store.save().await?;
    info!(path = %store.path().display(), "Settings reset");
    Ok(())
}
