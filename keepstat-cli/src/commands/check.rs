//! Check command - validate credentials, API path and health.

use anyhow::Result;
use keepstat_fetch::KarakeepClient;
use tracing::info;

use super::resolve_config;
use crate::output::{CheckOutput, ErrorOutput, HealthOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the check command.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli).await?;
    let client = KarakeepClient::new()?;
    info!(url = %config.base_url(), "Checking connection");

    let stats = client.get_stats(&config).await;
    let health = client.get_health(&config).await;

    let ok = stats.is_ok() && health.as_ref().is_ok_and(|h| !h.is_problem());

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.header(&format!("Checking {}", config.base_url())));

            match &stats {
                Ok(_) => println!("{}", formatter.format_ok("Stats endpoint")),
                Err(e) => println!("{}", formatter.format_error(&e.to_record())),
            }
            match &health {
                Ok(status) => println!("Health: {}", formatter.format_health(status)),
                Err(e) => println!("Health: {}", formatter.format_error(&e.to_record())),
            }
        }
        OutputFormat::Json => {
            let output = CheckOutput {
                url: config.base_url().to_string(),
                ok,
                stats_error: stats.as_ref().err().map(|e| ErrorOutput::from(&e.to_record())),
                health: health.as_ref().ok().map(HealthOutput::from),
                health_error: health.as_ref().err().map(|e| ErrorOutput::from(&e.to_record())),
            };
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    if !ok {
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
