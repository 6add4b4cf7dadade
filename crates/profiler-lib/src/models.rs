//! Core data models for the measurement core

use crate::error::{ProfilerError, Result};
use crate::stats::{LatencyPercentiles, LatencyStats};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default number of most-recent samples examined for stability
pub const DEFAULT_STABILITY_WINDOW: usize = 3;

/// Default maximum `(max - min) / average` spread for a stable window
pub const DEFAULT_STABILITY_THRESHOLD: f64 = 0.1;

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// A request that has completed, as recorded by the load generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedRequestRecord {
    pub start_ns: u64,
    pub end_ns: u64,
    #[serde(default)]
    pub sequence_id: u64,
    /// Request was sent later than its schedule called for
    #[serde(default)]
    pub delayed: bool,
}

impl CompletedRequestRecord {
    pub fn new(start_ns: u64, end_ns: u64, sequence_id: u64, delayed: bool) -> Self {
        Self {
            start_ns,
            end_ns,
            sequence_id,
            delayed,
        }
    }

    /// End-to-end latency; a record whose end precedes its start yields zero
    pub fn latency_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }
}

/// Measurement window `(start_ns, end_ns]` in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct LatencyWindow {
    start_ns: u64,
    end_ns: u64,
}

#[derive(Deserialize)]
struct RawWindow {
    start_ns: u64,
    end_ns: u64,
}

impl TryFrom<RawWindow> for LatencyWindow {
    type Error = ProfilerError;

    fn try_from(raw: RawWindow) -> Result<Self> {
        LatencyWindow::new(raw.start_ns, raw.end_ns)
    }
}

impl LatencyWindow {
    /// Create a window, rejecting empty or inverted intervals
    pub fn new(start_ns: u64, end_ns: u64) -> Result<Self> {
        if start_ns >= end_ns {
            return Err(ProfilerError::invalid_argument(format!(
                "window start ({start_ns}) must precede window end ({end_ns})"
            )));
        }
        Ok(Self { start_ns, end_ns })
    }

    pub fn start_ns(&self) -> u64 {
        self.start_ns
    }

    pub fn end_ns(&self) -> u64 {
        self.end_ns
    }

    /// True when `end_ns` falls inside the window
    pub fn contains_end(&self, end_ns: u64) -> bool {
        self.start_ns < end_ns && end_ns <= self.end_ns
    }

    pub fn duration_ns(&self) -> u64 {
        self.end_ns - self.start_ns
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ns() as f64 / NANOS_PER_SEC
    }
}

/// Per-tick throughput and latency samples, appended once per measurement
///
/// Both sequences are pushed together so they always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingHistory {
    throughput_samples: Vec<f64>,
    latency_samples: Vec<u64>,
}

impl RollingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from pre-recorded samples of equal length
    pub fn from_samples(throughput_samples: Vec<f64>, latency_samples: Vec<u64>) -> Result<Self> {
        if throughput_samples.len() != latency_samples.len() {
            return Err(ProfilerError::invalid_argument(format!(
                "history sample counts differ: {} throughput vs {} latency",
                throughput_samples.len(),
                latency_samples.len()
            )));
        }
        Ok(Self {
            throughput_samples,
            latency_samples,
        })
    }

    pub fn push(&mut self, throughput_per_sec: f64, latency_ns: u64) {
        self.throughput_samples.push(throughput_per_sec);
        self.latency_samples.push(latency_ns);
    }

    pub fn len(&self) -> usize {
        self.latency_samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latency_samples.is_empty()
    }

    pub fn throughput_samples(&self) -> &[f64] {
        &self.throughput_samples
    }

    pub fn latency_samples(&self) -> &[u64] {
        &self.latency_samples
    }

    /// The last `window_size` samples of each sequence
    ///
    /// Returns `None` when fewer than `window_size` samples exist (or the
    /// window is empty), so callers never compute an index below zero.
    pub fn recent(&self, window_size: usize) -> Option<(&[f64], &[u64])> {
        if window_size == 0 || self.len() < window_size {
            return None;
        }
        let from = self.len() - window_size;
        Some((&self.throughput_samples[from..], &self.latency_samples[from..]))
    }
}

/// Parameters controlling when a window of samples counts as stable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityParameters {
    /// Number of most-recent samples examined
    pub window_size: usize,
    /// Maximum allowed `(max - min) / average` spread
    pub relative_threshold: f64,
}

impl StabilityParameters {
    pub fn new(window_size: usize, relative_threshold: f64) -> Result<Self> {
        if window_size == 0 {
            return Err(ProfilerError::invalid_argument(
                "stability window must contain at least one sample",
            ));
        }
        if relative_threshold.is_nan() || relative_threshold <= 0.0 {
            return Err(ProfilerError::invalid_argument(
                "stability threshold must be positive",
            ));
        }
        Ok(Self {
            window_size,
            relative_threshold,
        })
    }
}

impl Default for StabilityParameters {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_STABILITY_WINDOW,
            relative_threshold: DEFAULT_STABILITY_THRESHOLD,
        }
    }
}

/// Latency budget for a profiling run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencySla {
    #[default]
    NoLimit,
    Threshold { threshold_ns: u64 },
}

impl LatencySla {
    /// Build from a millisecond budget; zero means no limit
    pub fn from_millis(threshold_ms: u64) -> Self {
        if threshold_ms == 0 {
            Self::NoLimit
        } else {
            Self::Threshold {
                threshold_ns: threshold_ms.saturating_mul(NANOS_PER_MILLI),
            }
        }
    }

    pub fn threshold_ns(&self) -> Option<u64> {
        match self {
            Self::NoLimit => None,
            Self::Threshold { threshold_ns } => Some(*threshold_ns),
        }
    }

    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Threshold { .. })
    }
}

/// Per-accelerator telemetry, one map per field keyed by accelerator id
///
/// A source may report some fields and not others, so each field is an
/// independent map rather than a struct per accelerator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorMetrics {
    /// Utilization as a fraction in `[0, 1]`
    #[serde(default)]
    pub utilization: BTreeMap<String, f64>,
    #[serde(default)]
    pub power_watts: BTreeMap<String, f64>,
    #[serde(default)]
    pub memory_used_bytes: BTreeMap<String, u64>,
    #[serde(default)]
    pub memory_total_bytes: BTreeMap<String, u64>,
}

impl AcceleratorMetrics {
    /// Every accelerator id that appears in any field
    pub fn accelerator_ids(&self) -> BTreeSet<&str> {
        self.utilization
            .keys()
            .chain(self.power_watts.keys())
            .chain(self.memory_used_bytes.keys())
            .chain(self.memory_total_bytes.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn accelerator_count(&self) -> usize {
        self.accelerator_ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.utilization.is_empty()
            && self.power_watts.is_empty()
            && self.memory_used_bytes.is_empty()
            && self.memory_total_bytes.is_empty()
    }
}

/// Derived measurements for one window, handed to report writers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub window_start_ns: u64,
    pub window_end_ns: u64,
    pub request_count: usize,
    pub delayed_request_count: usize,
    pub sequence_count: usize,
    pub throughput_per_sec: f64,
    /// `None` when no request completed inside the window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<LatencyPercentiles>,
    pub overhead_pct: f64,
    pub send_request_rate: f64,
    #[serde(default, skip_serializing_if = "AcceleratorMetrics::is_empty")]
    pub accelerators: AcceleratorMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rejects_inverted_bounds() {
        assert!(LatencyWindow::new(10, 10).is_err());
        assert!(LatencyWindow::new(11, 10).is_err());

        let window = LatencyWindow::new(4, 17).unwrap();
        assert_eq!(window.duration_ns(), 13);
        assert!(!window.contains_end(4));
        assert!(window.contains_end(17));
        assert!(!window.contains_end(18));
    }

    #[test]
    fn test_window_deserialize_validates() {
        let ok: LatencyWindow = serde_json::from_str(r#"{"start_ns": 0, "end_ns": 5}"#).unwrap();
        assert_eq!(ok.end_ns(), 5);

        let bad = serde_json::from_str::<LatencyWindow>(r#"{"start_ns": 5, "end_ns": 5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_history_recent_guards_short_history() {
        let mut history = RollingHistory::new();
        history.push(500.0, 1);
        history.push(510.0, 1);

        assert!(history.recent(3).is_none());
        assert!(history.recent(0).is_none());

        let (throughput, latency) = history.recent(2).unwrap();
        assert_eq!(throughput, &[500.0, 510.0]);
        assert_eq!(latency, &[1, 1]);
    }

    #[test]
    fn test_history_from_mismatched_samples() {
        assert!(RollingHistory::from_samples(vec![1.0, 2.0], vec![1]).is_err());
    }

    #[test]
    fn test_latency_sla_from_millis() {
        assert_eq!(LatencySla::from_millis(0), LatencySla::NoLimit);
        assert_eq!(LatencySla::from_millis(1).threshold_ns(), Some(1_000_000));
        assert!(!LatencySla::NoLimit.is_limited());
    }

    #[test]
    fn test_stability_parameters_validation() {
        assert!(StabilityParameters::new(0, 0.1).is_err());
        assert!(StabilityParameters::new(3, 0.0).is_err());
        assert!(StabilityParameters::new(3, f64::NAN).is_err());
        assert_eq!(
            StabilityParameters::new(3, 0.1).unwrap(),
            StabilityParameters::default()
        );
    }

    #[test]
    fn test_record_latency_saturates() {
        let record = CompletedRequestRecord::new(10, 4, 0, false);
        assert_eq!(record.latency_ns(), 0);
        assert_eq!(CompletedRequestRecord::new(3, 5, 0, false).latency_ns(), 2);
    }
}
