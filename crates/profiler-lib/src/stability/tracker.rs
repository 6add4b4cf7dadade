//! Per-tick stability state machine
//!
//! `Collecting -> Stable -> Done(Success)` or `Collecting -> Done(GaveUp)`.
//! `Done` is terminal; further ticks return the same outcome.

use super::{SingleProcess, StabilityCoordinator, StabilityEngine};
use crate::models::{LatencySla, RollingHistory, StabilityParameters};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// How profiling ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Stable window within the latency budget
    Success,
    /// Latency budget exceeded; more ticks will not help
    GaveUp,
}

/// Where the tracker stands after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityState {
    Collecting,
    /// Local window is stable; waiting on cooperating processes
    Stable,
    Done(Completion),
}

impl StabilityState {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

impl fmt::Display for StabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collecting => f.write_str("collecting"),
            Self::Stable => f.write_str("stable"),
            Self::Done(Completion::Success) => f.write_str("done (success)"),
            Self::Done(Completion::GaveUp) => f.write_str("done (gave up)"),
        }
    }
}

/// Drives the stability decision once per measurement tick
pub struct StabilityTracker {
    engine: StabilityEngine,
    sla: LatencySla,
    coordinator: Arc<dyn StabilityCoordinator>,
    state: StabilityState,
}

impl StabilityTracker {
    /// Tracker for a single profiler process
    pub fn new(params: StabilityParameters, sla: LatencySla) -> Self {
        Self::with_coordinator(params, sla, Arc::new(SingleProcess))
    }

    pub fn with_coordinator(
        params: StabilityParameters,
        sla: LatencySla,
        coordinator: Arc<dyn StabilityCoordinator>,
    ) -> Self {
        Self {
            engine: StabilityEngine::new(params),
            sla,
            coordinator,
            state: StabilityState::Collecting,
        }
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn engine(&self) -> &StabilityEngine {
        &self.engine
    }

    pub fn sla(&self) -> &LatencySla {
        &self.sla
    }

    /// Evaluate the latest history snapshot and advance the state
    pub fn tick(&mut self, history: &RollingHistory) -> StabilityState {
        if self.state.is_done() {
            return self.state;
        }

        let locally_stable = self.engine.determine_stability(history);
        let is_stable = self.coordinator.all_stable(locally_stable);

        let next = match self.engine.completion(history, &self.sla, is_stable) {
            Some(completion) => StabilityState::Done(completion),
            None if locally_stable => StabilityState::Stable,
            None => StabilityState::Collecting,
        };

        if next != self.state {
            debug!(
                from = %self.state,
                to = %next,
                samples = history.len(),
                "Stability state changed"
            );
        }
        self.state = next;
        next
    }
}
