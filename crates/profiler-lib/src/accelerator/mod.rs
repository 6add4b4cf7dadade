//! Per-accelerator telemetry merging and reporting
//!
//! Telemetry for the same accelerators arrives from several independent
//! sources each reporting cycle. This module merges those snapshots into one
//! and renders the merged result for interactive output.

mod merge;
mod report;

pub use merge::{merge_metrics, reduce_per_accelerator, Average, First, Max, Reduction};
pub use report::{format_accelerator_report, DEFAULT_DISPLAY_CAP, TOO_MANY_ACCELERATORS};
