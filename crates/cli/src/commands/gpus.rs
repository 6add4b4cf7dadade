//! Merge and display accelerator telemetry from a capture

use anyhow::{bail, Result};
use profiler_lib::accelerator::{format_accelerator_report, merge_metrics};
use profiler_lib::models::AcceleratorMetrics;
use tracing::debug;

use crate::capture::Capture;
use crate::output::{print_json, print_warning, OutputFormat};

/// Merge the telemetry of one reporting cycle (the last one by default)
pub fn merged_cycle(capture: &Capture, cycle: Option<usize>) -> Result<AcceleratorMetrics> {
    if capture.telemetry.is_empty() {
        bail!("Capture contains no telemetry");
    }

    let index = cycle.unwrap_or(capture.telemetry.len() - 1);
    if index >= capture.telemetry.len() {
        bail!(
            "Cycle {} out of range (capture has {} telemetry cycles)",
            index,
            capture.telemetry.len()
        );
    }

    let snapshots = capture.telemetry_for(index);
    let merged = merge_metrics(snapshots);
    debug!(
        cycle = index,
        sources = snapshots.len(),
        accelerators = merged.accelerator_count(),
        "Merged telemetry cycle"
    );
    Ok(merged)
}

/// Print merged accelerator metrics
pub fn show_gpus(
    capture: &Capture,
    cycle: Option<usize>,
    display_cap: usize,
    format: OutputFormat,
) -> Result<()> {
    let merged = merged_cycle(capture, cycle)?;

    match format {
        OutputFormat::Json => print_json(&merged)?,
        OutputFormat::Table => {
            if merged.is_empty() {
                print_warning("No accelerators reported in this cycle");
            } else {
                print!("{}", format_accelerator_report(&merged, display_cap));
            }
        }
    }

    Ok(())
}
