//! Watch command - poll until interrupted.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use keepstat_core::{RefreshOutcome, StatsSnapshot};
use keepstat_store::FnListener;
use std::io::{Write, stdout};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

use super::{build_coordinator, resolve_config};
use crate::output::{ErrorOutput, JsonFormatter, StatsOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the watch command.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli).await?;
    let url = config.base_url().to_string();
    let interval = config.poll_interval_secs();
    info!(url = %url, interval, "Starting watch mode");

    let coordinator = build_coordinator(config)?;
    let formatter = TextFormatter::new(!cli.no_color);
    coordinator.add_listener(printer(cli.format, cli.pretty, formatter, url, interval));
    coordinator.start()?;

    tokio::signal::ctrl_c().await?;
    coordinator.stop();
    info!("Watch stopped");
    Ok(())
}

/// Prints every outcome. On failure the last good readings stay on screen.
fn printer(
    format: OutputFormat,
    pretty: bool,
    formatter: TextFormatter,
    url: String,
    interval: u64,
) -> FnListener<impl Fn(&RefreshOutcome) + Send + Sync> {
    let last = Mutex::new(None::<(StatsSnapshot, DateTime<Utc>)>);

    FnListener::new(move |outcome: &RefreshOutcome| {
        let current = {
            let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(snapshot) = outcome.snapshot() {
                *last = Some((*snapshot, Utc::now()));
            }
            *last
        };

        match format {
            OutputFormat::Text => {
                print!("\x1b[2J\x1b[H");
                let now = Local::now();
                println!(
                    "{}",
                    formatter.header(&format!(
                        "keepstat watch - {} (refresh: {interval}s)",
                        now.format("%H:%M:%S")
                    ))
                );
                println!("{url}");
                println!();

                if let Some((snapshot, at)) = current {
                    println!("{}", formatter.format_snapshot(&snapshot));
                    if outcome.is_success() {
                        println!("{}", formatter.format_updated(at));
                    } else {
                        println!("{}", formatter.format_stale(at));
                    }
                }
                if let Some(error) = outcome.error() {
                    println!("{}", formatter.format_error(error));
                }

                println!();
                println!("Press Ctrl+C to exit");
            }
            OutputFormat::Json => {
                let output = StatsOutput {
                    url: url.clone(),
                    stats: current.map(|(snapshot, _)| snapshot),
                    updated_at: current.map(|(_, at)| at),
                    error: outcome.error().map(ErrorOutput::from),
                    health: None,
                };
                match JsonFormatter::new(pretty).format(&output) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(error = %e, "Failed to format update"),
                }
            }
        }
        let _ = stdout().flush();
    })
}
