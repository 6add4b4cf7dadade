//! Measurement window selection
//!
//! Attributes completed requests to a window by their end time only. A
//! request that started before the window opened still counts, with its full
//! latency; measuring only fully-contained requests would undercount slow
//! requests that straddle a boundary.

use crate::models::{CompletedRequestRecord, LatencyWindow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Requests attributed to one measurement window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSelection {
    /// Latencies in the order the records appear in the log
    pub latencies: Vec<u64>,
    pub delayed_request_count: usize,
    /// Number of distinct sequence ids among the selected records
    pub sequence_count: usize,
}

impl WindowSelection {
    pub fn request_count(&self) -> usize {
        self.latencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latencies.is_empty()
    }
}

/// Select the records whose end time falls in `(start, end]`
pub fn select_window(
    window: &LatencyWindow,
    records: &[CompletedRequestRecord],
) -> WindowSelection {
    let mut selection = WindowSelection::default();
    let mut sequence_ids = HashSet::new();

    for record in records
        .iter()
        .filter(|record| window.contains_end(record.end_ns))
    {
        selection.latencies.push(record.latency_ns());
        if record.delayed {
            selection.delayed_request_count += 1;
        }
        sequence_ids.insert(record.sequence_id);
    }

    selection.sequence_count = sequence_ids.len();
    selection
}
