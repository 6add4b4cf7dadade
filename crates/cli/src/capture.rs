//! Recorded profiling captures
//!
//! A capture holds everything the load loop handed the measurement core
//! during one run: the completed-request log, the measurement ticks, and the
//! telemetry snapshots collected for each tick.

use anyhow::{Context, Result};
use profiler_lib::models::{AcceleratorMetrics, CompletedRequestRecord};
use profiler_lib::session::MeasurementTick;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capture {
    #[serde(default)]
    pub records: Vec<CompletedRequestRecord>,
    #[serde(default)]
    pub ticks: Vec<MeasurementTick>,
    /// Telemetry snapshots per tick, one per source
    #[serde(default)]
    pub telemetry: Vec<Vec<AcceleratorMetrics>>,
}

impl Capture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read capture file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse capture file {}", path.display()))
    }

    /// Telemetry collected for tick `index`, empty when none was recorded
    pub fn telemetry_for(&self, index: usize) -> &[AcceleratorMetrics] {
        self.telemetry.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}
