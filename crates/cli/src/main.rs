//! Inference Load Profiler CLI
//!
//! Replays recorded profiling captures through the measurement core:
//! window selection, latency statistics, stability detection and
//! accelerator telemetry merging.

mod capture;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, gpus};
use profiler_lib::session::SessionOutcome;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Inference Load Profiler CLI
#[derive(Parser)]
#[command(name = "lprof")]
#[command(author, version, long_about = None)]
#[command(about = "Replay tool for the Inference Load Profiler")]
pub struct Cli {
    /// Configuration file (defaults to ./lprof.toml when present)
    #[arg(long, short, env = "LPROF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a capture and report when measurements stabilize
    Analyze {
        /// Capture file (JSON)
        capture: PathBuf,

        /// Number of recent measurements that must agree
        #[arg(long)]
        stability_window: Option<usize>,

        /// Allowed relative spread within the stability window
        #[arg(long)]
        stability_threshold: Option<f64>,

        /// Latency budget in milliseconds (0 for no limit)
        #[arg(long)]
        latency_threshold_ms: Option<u64>,

        /// Measurements attempted before giving up
        #[arg(long)]
        max_trials: Option<usize>,
    },

    /// Merge and show accelerator telemetry from a capture
    Gpus {
        /// Capture file (JSON)
        capture: PathBuf,

        /// Telemetry cycle to merge (defaults to the last one)
        #[arg(long)]
        cycle: Option<usize>,

        /// Accelerators listed individually before output is suppressed
        #[arg(long)]
        max_display: Option<usize>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays machine-readable with --format json.
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn run_id(capture: &Path) -> String {
    capture
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "capture".to_string())
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = config::ProfilerConfig::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, config.log_json);

    match cli.command {
        Commands::Analyze {
            capture,
            stability_window,
            stability_threshold,
            latency_threshold_ms,
            max_trials,
        } => {
            if let Some(window) = stability_window {
                config.stability_window = window;
            }
            if let Some(threshold) = stability_threshold {
                config.stability_threshold = threshold;
            }
            if let Some(threshold_ms) = latency_threshold_ms {
                config.latency_threshold_ms = threshold_ms;
            }
            if let Some(trials) = max_trials {
                config.max_trials = trials;
            }

            let loaded = capture::Capture::load(&capture)?;
            let outcome = analyze::analyze(&loaded, &config, &run_id(&capture), cli.format)?;

            Ok(match outcome {
                Some(SessionOutcome::Stable) => ExitCode::SUCCESS,
                _ => ExitCode::from(2),
            })
        }
        Commands::Gpus {
            capture,
            cycle,
            max_display,
        } => {
            let loaded = capture::Capture::load(&capture)?;
            let display_cap = max_display.unwrap_or(config.max_display_accelerators);
            gpus::show_gpus(&loaded, cycle, display_cap, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
