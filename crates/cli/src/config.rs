//! Profiler configuration
//!
//! Values come from an optional `lprof.toml` (or the file given with
//! `--config`), then `LPROF_*` environment variables, then command-line flags.

use anyhow::{Context, Result};
use profiler_lib::accelerator::DEFAULT_DISPLAY_CAP;
use profiler_lib::models::{
    LatencySla, StabilityParameters, DEFAULT_STABILITY_THRESHOLD, DEFAULT_STABILITY_WINDOW,
};
use profiler_lib::session::{SessionConfig, DEFAULT_MAX_TRIALS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Profiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilerConfig {
    /// Number of recent measurements that must agree for stability
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,

    /// Allowed relative spread within the stability window
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: f64,

    /// Latency budget in milliseconds; 0 disables the budget
    #[serde(default)]
    pub latency_threshold_ms: u64,

    /// Measurements attempted before giving up on stability
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,

    /// Accelerators listed individually in text output
    #[serde(default = "default_display_cap")]
    pub max_display_accelerators: usize,

    /// Emit logs as JSON instead of human-readable lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_stability_window() -> usize {
    DEFAULT_STABILITY_WINDOW
}

fn default_stability_threshold() -> f64 {
    DEFAULT_STABILITY_THRESHOLD
}

fn default_max_trials() -> usize {
    DEFAULT_MAX_TRIALS
}

fn default_display_cap() -> usize {
    DEFAULT_DISPLAY_CAP
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            stability_window: default_stability_window(),
            stability_threshold: default_stability_threshold(),
            latency_threshold_ms: 0,
            max_trials: default_max_trials(),
            max_display_accelerators: default_display_cap(),
            log_json: false,
        }
    }
}

impl ProfilerConfig {
    /// Load configuration from file and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = config::Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name("lprof").required(false)),
        };

        let config = builder
            .add_source(config::Environment::with_prefix("LPROF").try_parsing(true))
            .build()
            .context("Failed to read profiler configuration")?;

        config
            .try_deserialize()
            .context("Invalid profiler configuration")
    }

    /// Stability and stopping rules for a profiling session
    pub fn session_config(&self) -> Result<SessionConfig> {
        let stability = StabilityParameters::new(self.stability_window, self.stability_threshold)
            .context("Invalid stability settings")?;

        Ok(SessionConfig {
            stability,
            sla: LatencySla::from_millis(self.latency_threshold_ms),
            max_trials: self.max_trials.max(1),
        })
    }
}
