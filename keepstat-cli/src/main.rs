// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! keepstat CLI - Karakeep statistics from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Save connection settings once
//! keepstat config set --url https://keep.example.com --token ak1_...
//!
//! # Show current statistics
//! keepstat
//!
//! # JSON output
//! keepstat --format json --pretty
//!
//! # Poll every minute until Ctrl+C
//! keepstat --interval 60 watch
//!
//! # Check credentials and server health
//! keepstat check
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{check, config, stats, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// keepstat CLI - Karakeep statistics.
#[derive(Parser)]
#[command(name = "keepstat")]
#[command(about = "Karakeep statistics poller")]
#[command(long_about = r#"
keepstat polls a Karakeep server for bookmark statistics.

Readings: bookmarks, favorites, archived, highlights, lists, tags.

Connection settings come from, in order of precedence:
  1. --url / --token / --interval
  2. KEEPSTAT_URL / KEEPSTAT_TOKEN / KEEPSTAT_INTERVAL
  3. the settings file (see `keepstat config path`)

Examples:
  keepstat                         # Current statistics
  keepstat --format json           # JSON output
  keepstat watch                   # Poll until Ctrl+C
  keepstat check                   # Validate credentials and health
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'stats' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Karakeep base URL.
    #[arg(long, env = "KEEPSTAT_URL")]
    pub url: Option<String>,

    /// API token.
    #[arg(long, env = "KEEPSTAT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Poll interval in seconds (minimum 30).
    #[arg(long, env = "KEEPSTAT_INTERVAL")]
    pub interval: Option<u64>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch current statistics (default if no command specified).
    #[command(visible_alias = "s")]
    Stats,

    /// Poll on the configured interval and print every update.
    #[command(visible_alias = "w")]
    Watch,

    /// Check credentials, API path and server health.
    Check,

    /// Manage stored settings.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error, including a failed fetch.
    Error = 1,
    /// No usable connection settings.
    ConfigMissing = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("keepstat=debug,info")
    } else {
        EnvFilter::new("keepstat=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Stats) | None => stats::run(&cli).await,
        Some(Commands::Watch) => watch::run(&cli).await,
        Some(Commands::Check) => check::run(&cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        let code = if e.is::<commands::MissingConfig>() {
            ExitCode::ConfigMissing
        } else {
            ExitCode::Error
        };
        std::process::exit(code as i32);
    }

    Ok(())
}
