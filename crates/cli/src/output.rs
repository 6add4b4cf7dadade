//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use profiler_lib::session::SessionOutcome;
use profiler_lib::stability::StabilityState;
use profiler_lib::stats::UNDEFINED_STD_DEV_US;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table of rows
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No measurements".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a nanosecond latency with a readable unit
pub fn format_latency_ns(ns: u64) -> String {
    const US: u64 = 1_000;
    const MS: u64 = US * 1_000;
    const SEC: u64 = MS * 1_000;

    if ns >= SEC {
        format!("{:.2}s", ns as f64 / SEC as f64)
    } else if ns >= MS {
        format!("{:.2}ms", ns as f64 / MS as f64)
    } else if ns >= US {
        format!("{:.2}us", ns as f64 / US as f64)
    } else {
        format!("{}ns", ns)
    }
}

/// Format a standard deviation in microseconds; one-sample windows have none
pub fn format_std_dev_us(std_dev_us: Option<u64>) -> String {
    match std_dev_us {
        Some(UNDEFINED_STD_DEV_US) | None => "n/a".to_string(),
        Some(us) => format!("{}us", us),
    }
}

/// Format a per-second rate
pub fn format_rate(per_sec: f64) -> String {
    format!("{:.1}/s", per_sec)
}

/// Format a percentage
pub fn format_percent(pct: f64) -> String {
    format!("{:.1}%", pct)
}

/// Color a stability state
pub fn color_state(state: StabilityState) -> String {
    let text = state.to_string();
    match state {
        StabilityState::Collecting => text.yellow().to_string(),
        StabilityState::Stable => text.blue().to_string(),
        StabilityState::Done(_) => text.green().to_string(),
    }
}

/// Human description of a finished run
pub fn describe_outcome(outcome: SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::Stable => "Measurement stabilized",
        SessionOutcome::LatencyExceeded => "Latency exceeded the configured threshold",
        SessionOutcome::Unstable => "Failed to obtain a stable measurement",
    }
}
