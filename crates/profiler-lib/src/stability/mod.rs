//! Stability detection for windowed measurements
//!
//! This module decides, once per measurement tick:
//! - Whether the most recent throughput and latency samples have converged
//! - Whether the latency budget is met or already exceeded
//! - Whether profiling can stop, and with which outcome

mod coordinator;
mod engine;
mod tracker;

#[cfg(test)]
mod tests;

pub use coordinator::{SingleProcess, StabilityCoordinator};
pub use engine::{StabilityEngine, ThresholdCheck};
pub use tracker::{Completion, StabilityState, StabilityTracker};
