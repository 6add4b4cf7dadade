//! Stability and latency-budget checks over a rolling history
//!
//! Every check looks at the last `window_size` samples only. When the history
//! is shorter than that, the checks report "not stable" and "not within
//! threshold" without computing anything.

use super::tracker::Completion;
use crate::models::{LatencySla, RollingHistory, StabilityParameters};

/// Outcome of comparing the windowed mean latency against a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdCheck {
    Within,
    Exceeded,
    /// Fewer samples than the stability window
    InsufficientData,
}

/// Pure decision procedure over rolling (throughput, latency) samples
#[derive(Debug, Clone, Copy, Default)]
pub struct StabilityEngine {
    params: StabilityParameters,
}

impl StabilityEngine {
    pub fn new(params: StabilityParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StabilityParameters {
        &self.params
    }

    /// Compare the mean of the windowed latency samples to `threshold_ns`
    pub fn threshold_check(&self, history: &RollingHistory, threshold_ns: u64) -> ThresholdCheck {
        let Some((_, latencies)) = history.recent(self.params.window_size) else {
            return ThresholdCheck::InsufficientData;
        };

        let sum: u128 = latencies.iter().map(|&l| u128::from(l)).sum();
        let mean_ns = sum / latencies.len() as u128;

        if mean_ns <= u128::from(threshold_ns) {
            ThresholdCheck::Within
        } else {
            ThresholdCheck::Exceeded
        }
    }

    /// True iff the windowed mean latency is at most `threshold_ns`
    pub fn check_within_threshold(&self, history: &RollingHistory, threshold_ns: u64) -> bool {
        self.threshold_check(history, threshold_ns) == ThresholdCheck::Within
    }

    /// True iff both throughput and latency spreads are within the threshold
    pub fn check_window_for_stability(&self, history: &RollingHistory) -> bool {
        let Some((throughput, latencies)) = history.recent(self.params.window_size) else {
            return false;
        };

        let throughput_spread = relative_spread(throughput.iter().copied());
        let latency_spread = relative_spread(latencies.iter().map(|&l| l as f64));

        throughput_spread <= self.params.relative_threshold
            && latency_spread <= self.params.relative_threshold
    }

    /// Stability check that rejects any window containing a zero-throughput tick
    pub fn determine_stability(&self, history: &RollingHistory) -> bool {
        let Some((throughput, _)) = history.recent(self.params.window_size) else {
            return false;
        };

        if throughput.iter().any(|&t| t == 0.0) {
            return false;
        }

        self.check_window_for_stability(history)
    }

    /// Whether profiling can stop
    pub fn is_done_profiling(
        &self,
        history: &RollingHistory,
        sla: &LatencySla,
        is_stable: bool,
    ) -> bool {
        self.completion(history, sla, is_stable).is_some()
    }

    /// The terminal outcome, if profiling can stop now
    ///
    /// Success needs a stable window within the latency budget. A finite
    /// budget that the window mean already exceeds ends profiling even
    /// without stability.
    pub fn completion(
        &self,
        history: &RollingHistory,
        sla: &LatencySla,
        is_stable: bool,
    ) -> Option<Completion> {
        let check = match sla.threshold_ns() {
            Some(threshold_ns) => self.threshold_check(history, threshold_ns),
            None if history.recent(self.params.window_size).is_some() => ThresholdCheck::Within,
            None => ThresholdCheck::InsufficientData,
        };

        match check {
            ThresholdCheck::Exceeded => Some(Completion::GaveUp),
            ThresholdCheck::Within if is_stable => Some(Completion::Success),
            _ => None,
        }
    }
}

/// `(max - min) / average`, zero for a flat window
fn relative_spread(values: impl Iterator<Item = f64>) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in values {
        min = min.min(value);
        max = max.max(value);
        sum += value;
        count += 1;
    }

    if count == 0 || max == min {
        return 0.0;
    }

    let average = sum / count as f64;
    if average <= 0.0 {
        return f64::INFINITY;
    }
    (max - min) / average
}
