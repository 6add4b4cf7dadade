//! Observability infrastructure for the profiler
//!
//! Provides:
//! - Prometheus metrics (window latency, stability checks, profiling outcomes)
//! - Structured logging of measurement events with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for per-window mean latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ProfilerMetricsInner> = OnceLock::new();

struct ProfilerMetricsInner {
    window_latency_seconds: Histogram,
    windows_measured: IntCounter,
    stability_checks: IntCounterVec,
    profiling_outcomes: IntCounterVec,
    accelerators_merged: IntGauge,
    telemetry_sources: IntGauge,
}

impl ProfilerMetricsInner {
    fn new() -> Self {
        Self {
            window_latency_seconds: register_histogram!(
                "load_profiler_window_latency_seconds",
                "Mean request latency of each measurement window",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register window_latency_seconds"),

            windows_measured: register_int_counter!(
                "load_profiler_windows_measured_total",
                "Number of measurement windows evaluated"
            )
            .expect("Failed to register windows_measured"),

            stability_checks: register_int_counter_vec!(
                "load_profiler_stability_checks_total",
                "Stability evaluations by resulting state",
                &["state"]
            )
            .expect("Failed to register stability_checks"),

            profiling_outcomes: register_int_counter_vec!(
                "load_profiler_outcomes_total",
                "Finished profiling runs by outcome",
                &["outcome"]
            )
            .expect("Failed to register profiling_outcomes"),

            accelerators_merged: register_int_gauge!(
                "load_profiler_accelerators_merged",
                "Accelerators present in the last merged telemetry snapshot"
            )
            .expect("Failed to register accelerators_merged"),

            telemetry_sources: register_int_gauge!(
                "load_profiler_telemetry_sources",
                "Telemetry sources contributing to the last merge"
            )
            .expect("Failed to register telemetry_sources"),
        }
    }
}

/// Profiler metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ProfilerMetrics {
    _private: (),
}

impl Default for ProfilerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfilerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ProfilerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ProfilerMetricsInner {
        GLOBAL_METRICS.get_or_init(ProfilerMetricsInner::new)
    }

    /// Record one evaluated window and its mean latency
    pub fn observe_window(&self, mean_latency_ns: u64) {
        let inner = self.inner();
        inner.windows_measured.inc();
        inner
            .window_latency_seconds
            .observe(mean_latency_ns as f64 / 1e9);
    }

    pub fn inc_stability_check(&self, state: &str) {
        self.inner()
            .stability_checks
            .with_label_values(&[state])
            .inc();
    }

    pub fn inc_profiling_outcome(&self, outcome: &str) {
        self.inner()
            .profiling_outcomes
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn set_merge_stats(&self, sources: usize, accelerators: usize) {
        self.inner().telemetry_sources.set(sources as i64);
        self.inner().accelerators_merged.set(accelerators as i64);
    }
}

/// Structured logger for profiling events
#[derive(Clone)]
pub struct StructuredLogger {
    run_id: String,
}

impl StructuredLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Log a measured window
    pub fn log_window_measured(
        &self,
        tick: usize,
        request_count: usize,
        throughput_per_sec: f64,
        mean_latency_ns: u64,
        std_dev_us: Option<u64>,
    ) {
        debug!(
            event = "window_measured",
            run_id = %self.run_id,
            tick = tick,
            request_count = request_count,
            throughput_per_sec = throughput_per_sec,
            mean_latency_ns = mean_latency_ns,
            std_dev_us = ?std_dev_us,
            "Measurement window evaluated"
        );
    }

    /// Log a window in which no request completed
    pub fn log_empty_window(&self, tick: usize, window_start_ns: u64, window_end_ns: u64) {
        warn!(
            event = "empty_window",
            run_id = %self.run_id,
            tick = tick,
            window_start_ns = window_start_ns,
            window_end_ns = window_end_ns,
            "No requests completed in measurement window"
        );
    }

    /// Log the stability decision for a tick
    pub fn log_stability_state(&self, tick: usize, state: &str, samples: usize) {
        debug!(
            event = "stability_evaluated",
            run_id = %self.run_id,
            tick = tick,
            state = %state,
            samples = samples,
            "Stability evaluated"
        );
    }

    /// Log the end of a profiling run
    pub fn log_profiling_finished(&self, outcome: &str, ticks: usize) {
        match outcome {
            "success" => {
                info!(
                    event = "profiling_finished",
                    run_id = %self.run_id,
                    outcome = %outcome,
                    ticks = ticks,
                    "Measurement stabilized"
                );
            }
            _ => {
                warn!(
                    event = "profiling_finished",
                    run_id = %self.run_id,
                    outcome = %outcome,
                    ticks = ticks,
                    "Profiling stopped without a stable measurement"
                );
            }
        }
    }

    /// Log a telemetry merge
    pub fn log_telemetry_merged(&self, sources: usize, accelerators: usize) {
        debug!(
            event = "telemetry_merged",
            run_id = %self.run_id,
            sources = sources,
            accelerators = accelerators,
            "Merged accelerator telemetry"
        );
    }
}
