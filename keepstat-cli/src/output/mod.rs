//! Output formatting for CLI.

mod json;
mod text;

pub use json::{CheckOutput, ErrorOutput, HealthOutput, JsonFormatter, SettingsOutput, StatsOutput};
pub use text::TextFormatter;
