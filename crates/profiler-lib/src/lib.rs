//! Measurement core for the inference load profiler
//!
//! This crate provides the analysis that runs while load is in flight:
//! - Window selection over completed-request timestamps
//! - Overflow-safe latency statistics
//! - Stability detection and the profiling stop decision
//! - Per-accelerator telemetry merging and report formatting
//! - Observability (Prometheus metrics and structured logging)

pub mod accelerator;
pub mod error;
pub mod models;
pub mod observability;
pub mod session;
pub mod stability;
pub mod stats;
pub mod summary;
pub mod window;

pub use error::{ProfilerError, Result};
pub use models::*;
pub use observability::{ProfilerMetrics, StructuredLogger};
