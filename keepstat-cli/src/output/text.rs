//! Text output formatting with colors.

use chrono::{DateTime, Local, Utc};
use keepstat_core::{ErrorRecord, HealthStatus, StatsSnapshot};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the six readings, one per line.
    pub fn format_snapshot(&self, snapshot: &StatsSnapshot) -> String {
        snapshot
            .readings()
            .iter()
            .map(|(kind, value)| {
                format!(
                    "{:<12}{}",
                    format!("{}:", kind.display_name()),
                    self.cyan(&format!("{value:>8}"))
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats a failed cycle.
    pub fn format_error(&self, error: &ErrorRecord) -> String {
        format!(
            "{} {} {}",
            self.red("✗"),
            self.red(&error.to_string()),
            self.dim(&format!("({})", error.kind.reason_code()))
        )
    }

    /// Formats when data was last refreshed.
    pub fn format_updated(&self, at: DateTime<Utc>) -> String {
        self.dim(&format!("Updated {}", local_time(at)))
    }

    /// Formats a notice that the readings shown are from an earlier cycle.
    pub fn format_stale(&self, last_success_at: DateTime<Utc>) -> String {
        self.yellow(&format!("Showing data from {}", local_time(last_success_at)))
    }

    /// Formats a health result.
    pub fn format_health(&self, health: &HealthStatus) -> String {
        let detail = format!("{} (HTTP {})", health.status, health.status_code);
        if health.is_problem() {
            format!("{} {}", self.red("✗"), self.red(&detail))
        } else {
            format!("{} {}", self.green("✓"), detail)
        }
    }

    /// Formats a passed check line.
    pub fn format_ok(&self, label: &str) -> String {
        format!("{} {}", self.green("✓"), label)
    }

    /// Formats a section header.
    pub fn header(&self, title: &str) -> String {
        format!("{}\n{}", self.bold(title), "─".repeat(40))
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    fn paint(&self, color: &str, s: &str) -> String {
        if self.use_colors {
            format!("{color}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint(CYAN, s)
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}
