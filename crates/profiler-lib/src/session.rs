//! Per-tick profiling driver
//!
//! The load loop hands the session one measurement tick at a time together
//! with an immutable snapshot of the completed-request log and the telemetry
//! collected for that cycle. The session turns the window into a summary,
//! appends it to the rolling history and advances the stability tracker.

use crate::accelerator::merge_metrics;
use crate::error::{ProfilerError, Result};
use crate::models::{
    AcceleratorMetrics, CompletedRequestRecord, LatencySla, LatencyWindow, ReportSummary,
    RollingHistory, StabilityParameters,
};
use crate::observability::{ProfilerMetrics, StructuredLogger};
use crate::stability::{
    Completion, SingleProcess, StabilityCoordinator, StabilityState, StabilityTracker,
};
use crate::window::select_window;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ticks allowed before a run is declared unstable
pub const DEFAULT_MAX_TRIALS: usize = 10;

/// Settings for one profiling run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub stability: StabilityParameters,
    pub sla: LatencySla,
    pub max_trials: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stability: StabilityParameters::default(),
            sla: LatencySla::NoLimit,
            max_trials: DEFAULT_MAX_TRIALS,
        }
    }
}

/// One measurement window as reported by the load loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementTick {
    pub window: LatencyWindow,
    /// Time the load generator spent idle during the window
    #[serde(default)]
    pub idle_ns: u64,
    /// Requests sent during the window
    #[serde(default)]
    pub num_sent: usize,
}

/// How a profiling run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Throughput and latency converged within the latency budget
    Stable,
    /// Windowed latency exceeded the budget
    LatencyExceeded,
    /// The trial limit was reached without convergence
    Unstable,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "success",
            Self::LatencyExceeded => "gave_up",
            Self::Unstable => "unstable",
        }
    }
}

/// Result of recording one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// One-based tick number
    pub tick: usize,
    pub summary: ReportSummary,
    pub state: StabilityState,
    /// Set on the tick that ends the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionOutcome>,
}

/// Owns the rolling history of one profiling run
pub struct ProfilingSession {
    tracker: StabilityTracker,
    history: RollingHistory,
    max_trials: usize,
    ticks: usize,
    outcome: Option<SessionOutcome>,
    metrics: ProfilerMetrics,
    logger: StructuredLogger,
}

impl ProfilingSession {
    pub fn new(config: SessionConfig, logger: StructuredLogger) -> Self {
        Self::with_coordinator(config, logger, Arc::new(SingleProcess))
    }

    pub fn with_coordinator(
        config: SessionConfig,
        logger: StructuredLogger,
        coordinator: Arc<dyn StabilityCoordinator>,
    ) -> Self {
        Self {
            tracker: StabilityTracker::with_coordinator(config.stability, config.sla, coordinator),
            history: RollingHistory::new(),
            max_trials: config.max_trials,
            ticks: 0,
            outcome: None,
            metrics: ProfilerMetrics::new(),
            logger,
        }
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Merge this cycle's telemetry snapshots
    pub fn merge_telemetry(&self, snapshots: &[AcceleratorMetrics]) -> AcceleratorMetrics {
        let merged = merge_metrics(snapshots);
        let accelerators = merged.accelerator_count();
        self.metrics.set_merge_stats(snapshots.len(), accelerators);
        self.logger.log_telemetry_merged(snapshots.len(), accelerators);
        merged
    }

    /// Evaluate one window and advance the stability decision
    pub fn record_tick(
        &mut self,
        records: &[CompletedRequestRecord],
        tick: &MeasurementTick,
        telemetry: &[AcceleratorMetrics],
    ) -> Result<TickReport> {
        if let Some(outcome) = self.outcome {
            return Err(ProfilerError::invalid_argument(format!(
                "profiling session already finished ({})",
                outcome.as_str()
            )));
        }

        self.ticks += 1;
        let selection = select_window(&tick.window, records);
        let accelerators = self.merge_telemetry(telemetry);
        let summary = ReportSummary::build(
            &tick.window,
            &selection,
            tick.idle_ns,
            tick.num_sent,
            accelerators,
        )?;

        if selection.is_empty() {
            self.logger.log_empty_window(
                self.ticks,
                tick.window.start_ns(),
                tick.window.end_ns(),
            );
        } else {
            self.metrics.observe_window(summary.mean_latency_ns());
        }
        self.logger.log_window_measured(
            self.ticks,
            summary.request_count,
            summary.throughput_per_sec,
            summary.mean_latency_ns(),
            summary.latency.map(|l| l.std_dev_us),
        );

        self.history.push(summary.throughput_per_sec, summary.mean_latency_ns());
        let state = self.tracker.tick(&self.history);

        let state_label = state_label(state);
        self.metrics.inc_stability_check(state_label);
        self.logger.log_stability_state(self.ticks, state_label, self.history.len());

        let outcome = match state {
            StabilityState::Done(Completion::Success) => Some(SessionOutcome::Stable),
            StabilityState::Done(Completion::GaveUp) => Some(SessionOutcome::LatencyExceeded),
            _ if self.ticks >= self.max_trials => Some(SessionOutcome::Unstable),
            _ => None,
        };

        if let Some(outcome) = outcome {
            self.outcome = Some(outcome);
            self.metrics.inc_profiling_outcome(outcome.as_str());
            self.logger.log_profiling_finished(outcome.as_str(), self.ticks);
        }

        Ok(TickReport {
            tick: self.ticks,
            summary,
            state,
            outcome,
        })
    }
}

fn state_label(state: StabilityState) -> &'static str {
    match state {
        StabilityState::Collecting => "collecting",
        StabilityState::Stable => "stable",
        StabilityState::Done(_) => "done",
    }
}
