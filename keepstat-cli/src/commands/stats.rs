//! Stats command - one refresh, then print.

use anyhow::Result;
use keepstat_core::RefreshOutcome;
use tracing::info;

use super::{build_coordinator, resolve_config};
use crate::output::{ErrorOutput, HealthOutput, JsonFormatter, StatsOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the stats command.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli).await?;
    let url = config.base_url().to_string();
    info!(url = %url, "Fetching stats");

    let coordinator = build_coordinator(config)?;
    let outcome = coordinator.request_refresh().await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            match &outcome {
                RefreshOutcome::Success { snapshot } => {
                    println!("{}", formatter.header(&format!("Karakeep ({url})")));
                    println!("{}", formatter.format_snapshot(snapshot));
                    if let Some(at) = coordinator.last_success_at() {
                        println!("{}", formatter.format_updated(at));
                    }
                }
                RefreshOutcome::Failure { error } => {
                    println!("{}", formatter.format_error(error));
                }
            }
            if let Some(health) = coordinator.last_health().filter(|h| h.is_problem()) {
                println!("{}", formatter.format_health(&health));
            }
        }
        OutputFormat::Json => {
            let output = StatsOutput {
                url,
                stats: coordinator.last_snapshot(),
                updated_at: coordinator.last_success_at(),
                error: outcome.error().map(ErrorOutput::from),
                health: coordinator.last_health().as_ref().map(HealthOutput::from),
            };
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    if !outcome.is_success() {
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
