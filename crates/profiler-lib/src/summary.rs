//! Derived report fields for a measurement window

use crate::error::{ProfilerError, Result};
use crate::models::{AcceleratorMetrics, LatencyWindow, ReportSummary};
use crate::stats::{latency_percentiles, latency_stats};
use crate::window::WindowSelection;

/// Percentage of the window the load generator spent busy (not idle)
///
/// Idle time measured slightly above the window length is a benign race,
/// so the result is clamped at zero rather than going negative.
pub fn summarize_overhead(window_duration_ns: u64, idle_ns: u64) -> f64 {
    if window_duration_ns == 0 {
        return 0.0;
    }
    let busy_ns = window_duration_ns.saturating_sub(idle_ns);
    busy_ns as f64 * 100.0 / window_duration_ns as f64
}

/// Requests sent per second over the window
pub fn summarize_send_request_rate(
    window_duration_s: f64,
    num_sent_requests: usize,
) -> Result<f64> {
    if window_duration_s.is_nan() || window_duration_s <= 0.0 {
        return Err(ProfilerError::invalid_argument(
            "window_duration_s must be positive",
        ));
    }
    Ok(num_sent_requests as f64 / window_duration_s)
}

impl ReportSummary {
    /// Assemble the report for one window from its selected requests
    pub fn build(
        window: &LatencyWindow,
        selection: &WindowSelection,
        idle_ns: u64,
        num_sent_requests: usize,
        accelerators: AcceleratorMetrics,
    ) -> Result<Self> {
        let window_secs = window.duration_secs();

        let (latency, percentiles) = if selection.is_empty() {
            (None, None)
        } else {
            (
                Some(latency_stats(&selection.latencies)?),
                Some(latency_percentiles(&selection.latencies)?),
            )
        };

        Ok(Self {
            window_start_ns: window.start_ns(),
            window_end_ns: window.end_ns(),
            request_count: selection.request_count(),
            delayed_request_count: selection.delayed_request_count,
            sequence_count: selection.sequence_count,
            throughput_per_sec: selection.request_count() as f64 / window_secs,
            latency,
            percentiles,
            overhead_pct: summarize_overhead(window.duration_ns(), idle_ns),
            send_request_rate: summarize_send_request_rate(window_secs, num_sent_requests)?,
            accelerators,
        })
    }

    /// Mean latency, or zero when nothing completed in the window
    pub fn mean_latency_ns(&self) -> u64 {
        self.latency.map(|l| l.mean_ns).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompletedRequestRecord;
    use crate::window::select_window;

    #[test]
    fn test_overhead() {
        assert!((summarize_overhead(100, 63) - 37.0).abs() < 1e-9);
        assert!((summarize_overhead(234, 56) - 76.068).abs() < 1e-3);
    }

    #[test]
    fn test_overhead_clamped_when_idle_exceeds_window() {
        assert_eq!(summarize_overhead(100, 101), 0.0);
        assert_eq!(summarize_overhead(0, 0), 0.0);
    }

    #[test]
    fn test_send_request_rate() {
        let rate = summarize_send_request_rate(2.0, 100).unwrap();
        assert!((rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_send_request_rate_rejects_non_positive_window() {
        for window in [0.0, -1.0, f64::NAN] {
            let err = summarize_send_request_rate(window, 0).unwrap_err();
            assert_eq!(
                err,
                ProfilerError::InvalidArgument("window_duration_s must be positive".into())
            );
            assert_eq!(err.to_string(), "window_duration_s must be positive");
        }
    }

    #[test]
    fn test_build_summary() {
        // 0.5 second window
        let window = LatencyWindow::new(1_000_000_000, 1_500_000_000).unwrap();
        let records = vec![
            CompletedRequestRecord::new(900_000_000, 1_100_000_000, 1, false),
            CompletedRequestRecord::new(1_100_000_000, 1_300_000_000, 2, true),
            CompletedRequestRecord::new(1_200_000_000, 1_600_000_000, 3, false),
        ];
        let selection = select_window(&window, &records);

        let summary = ReportSummary::build(
            &window,
            &selection,
            100_000_000,
            5,
            AcceleratorMetrics::default(),
        )
        .unwrap();

        assert_eq!(summary.request_count, 2);
        assert_eq!(summary.delayed_request_count, 1);
        assert_eq!(summary.sequence_count, 2);
        assert!((summary.throughput_per_sec - 4.0).abs() < 1e-9);
        assert!((summary.send_request_rate - 10.0).abs() < 1e-9);
        assert!((summary.overhead_pct - 80.0).abs() < 1e-9);
        assert_eq!(summary.mean_latency_ns(), 200_000_000);
        assert_eq!(summary.latency.unwrap().std_dev_us, 0);
    }

    #[test]
    fn test_build_summary_for_empty_window() {
        let window = LatencyWindow::new(0, 1_000_000_000).unwrap();
        let summary = ReportSummary::build(
            &window,
            &WindowSelection::default(),
            0,
            0,
            AcceleratorMetrics::default(),
        )
        .unwrap();

        assert_eq!(summary.request_count, 0);
        assert!(summary.latency.is_none());
        assert!(summary.percentiles.is_none());
        assert_eq!(summary.mean_latency_ns(), 0);
        assert_eq!(summary.throughput_per_sec, 0.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("latency").is_none());
        assert!(json.get("accelerators").is_none());
    }
}
