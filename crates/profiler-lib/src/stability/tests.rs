//! Scenario tests for stability detection
//!
//! Each test builds a rolling history the way the profiling loop would
//! after a few ticks and checks the decision for it.

#[cfg(test)]
mod stability_scenarios {
    use crate::models::{LatencySla, RollingHistory, StabilityParameters};
    use crate::stability::{
        Completion, StabilityCoordinator, StabilityEngine, StabilityState, StabilityTracker,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn history(throughput: &[f64], latencies: &[u64]) -> RollingHistory {
        RollingHistory::from_samples(throughput.to_vec(), latencies.to_vec()).unwrap()
    }

    fn engine(window_size: usize) -> StabilityEngine {
        StabilityEngine::new(StabilityParameters::new(window_size, 0.1).unwrap())
    }

    /// Done check the way the profiling loop runs it: stability first
    fn is_done(history: &RollingHistory, window_size: usize, sla: LatencySla) -> bool {
        let engine = engine(window_size);
        let is_stable = engine.determine_stability(history);
        engine.is_done_profiling(history, &sla, is_stable)
    }

    #[test]
    fn test_throughput_not_stable() {
        let h = history(&[1.0, 1000.0, 500.0], &[1, 1, 1]);
        assert!(!engine(3).check_window_for_stability(&h));
    }

    #[test]
    fn test_throughput_stable() {
        let h = history(&[500.0, 520.0, 510.0], &[1, 1, 1]);
        assert!(engine(3).check_window_for_stability(&h));
    }

    #[test]
    fn test_latency_not_stable() {
        let h = history(&[500.0, 520.0, 510.0], &[100, 106, 112]);
        assert!(!engine(3).check_window_for_stability(&h));
    }

    #[test]
    fn test_latency_stable() {
        let h = history(&[500.0, 520.0, 510.0], &[100, 104, 108]);
        assert!(engine(3).check_window_for_stability(&h));
    }

    #[test]
    fn test_throughput_stable_after_many_measurements() {
        let h = history(
            &[1.0, 1000.0, 500.0, 1500.0, 500.0, 520.0, 510.0],
            &[1, 1, 1, 1, 1, 1, 1],
        );
        assert!(engine(3).check_window_for_stability(&h));
    }

    #[test]
    fn test_stability_window_of_five() {
        let h = history(
            &[500.0, 520.0, 510.0, 505.0, 515.0],
            &[100, 104, 108, 102, 106],
        );
        assert!(engine(5).check_window_for_stability(&h));
    }

    #[test]
    fn test_not_stable_in_five_but_stable_in_three() {
        let h = history(
            &[1.0, 1000.0, 510.0, 505.0, 515.0],
            &[100, 104, 108, 102, 106],
        );
        assert!(!engine(5).check_window_for_stability(&h));
        assert!(engine(3).check_window_for_stability(&h));
    }

    #[test]
    fn test_stability_window_of_two() {
        let h = history(
            &[500.0, 1000.0, 1.0, 505.0, 515.0],
            &[100, 104, 108, 102, 106],
        );
        assert!(engine(2).check_window_for_stability(&h));
    }

    #[test]
    fn test_not_within_threshold() {
        let h = history(&[500.0, 520.0, 510.0], &[2_000_000, 2_000_000, 2_000_000]);
        assert!(!engine(3).check_within_threshold(&h, 1_000_000));
    }

    #[test]
    fn test_within_threshold() {
        let h = history(&[500.0, 520.0, 510.0], &[100_000, 100_000, 100_000]);
        assert!(engine(3).check_within_threshold(&h, 1_000_000));
    }

    #[test]
    fn test_zero_throughput_is_never_stable() {
        let h = history(&[500.0, 0.0, 510.0], &[1, 1, 1]);
        assert!(!engine(3).determine_stability(&h));

        let h = history(&[500.0, 520.0, 510.0], &[1, 1, 1]);
        assert!(engine(3).determine_stability(&h));
    }

    #[test]
    fn test_zero_throughput_outside_window_is_ignored() {
        let h = history(&[0.0, 500.0, 520.0, 510.0], &[1, 1, 1, 1]);
        assert!(engine(3).determine_stability(&h));
    }

    #[test]
    fn test_no_limit_and_unstable_is_not_done() {
        let h = history(&[1.0, 1000.0, 500.0], &[1, 1, 1]);
        assert!(!is_done(&h, 3, LatencySla::NoLimit));
    }

    #[test]
    fn test_no_limit_and_stable_is_done() {
        let h = history(&[500.0, 520.0, 510.0], &[2_000_000, 2_000_000, 2_000_000]);
        assert!(is_done(&h, 3, LatencySla::NoLimit));
    }

    #[test]
    fn test_exceeding_latency_budget_gives_up() {
        let h = history(&[1.0, 1000.0, 500.0], &[2_000_000, 2_000_000, 2_000_000]);
        assert!(is_done(&h, 3, LatencySla::from_millis(1)));

        let engine = engine(3);
        assert_eq!(
            engine.completion(&h, &LatencySla::from_millis(1), false),
            Some(Completion::GaveUp)
        );
    }

    #[test]
    fn test_stability_completes_profiling() {
        let sla = LatencySla::from_millis(1);
        let h = history(&[1.0, 1000.0, 500.0], &[1, 1, 1]);
        assert!(!is_done(&h, 3, sla));

        let h = history(&[500.0, 520.0, 510.0], &[1, 1, 1]);
        assert!(is_done(&h, 3, sla));
    }

    #[test]
    fn test_short_history_is_not_done() {
        let h = history(&[500.0, 510.0], &[1, 1]);
        let engine = engine(3);

        assert!(!engine.check_within_threshold(&h, u64::MAX));
        assert!(!engine.check_window_for_stability(&h));
        assert!(!engine.determine_stability(&h));
        assert!(!is_done(&h, 3, LatencySla::from_millis(1)));
        assert!(!is_done(&h, 3, LatencySla::NoLimit));
        // Even a caller that claims stability cannot finish on short history.
        assert!(!engine.is_done_profiling(&h, &LatencySla::NoLimit, true));
    }

    #[test]
    fn test_short_history_over_budget_is_not_done() {
        let h = history(&[500.0, 510.0], &[5_000_000, 5_000_000]);
        assert!(!is_done(&h, 3, LatencySla::from_millis(1)));
    }

    #[test]
    fn test_tracker_walks_to_success() {
        let params = StabilityParameters::new(3, 0.1).unwrap();
        let mut tracker = StabilityTracker::new(params, LatencySla::from_millis(1));
        let mut h = RollingHistory::new();

        for (throughput, latency) in [(1.0, 1), (1000.0, 1), (500.0, 1), (520.0, 1)] {
            h.push(throughput, latency);
            assert_eq!(tracker.tick(&h), StabilityState::Collecting);
        }

        h.push(510.0, 1);
        assert_eq!(
            tracker.tick(&h),
            StabilityState::Done(Completion::Success)
        );

        // Terminal: a noisy tick afterwards does not reopen profiling.
        h.push(1.0, 1);
        assert_eq!(
            tracker.tick(&h),
            StabilityState::Done(Completion::Success)
        );
    }

    #[test]
    fn test_tracker_gives_up_on_latency() {
        let params = StabilityParameters::default();
        let mut tracker = StabilityTracker::new(params, LatencySla::from_millis(1));
        let mut h = RollingHistory::new();

        h.push(1.0, 3_000_000);
        h.push(1000.0, 3_000_000);
        assert_eq!(tracker.tick(&h), StabilityState::Collecting);

        h.push(500.0, 3_000_000);
        assert_eq!(tracker.tick(&h), StabilityState::Done(Completion::GaveUp));
    }

    /// Peers become stable only when told so
    struct Peers {
        stable: AtomicBool,
    }

    impl StabilityCoordinator for Peers {
        fn all_stable(&self, locally_stable: bool) -> bool {
            locally_stable && self.stable.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_tracker_waits_for_peers() {
        let peers = Arc::new(Peers {
            stable: AtomicBool::new(false),
        });
        let mut tracker = StabilityTracker::with_coordinator(
            StabilityParameters::default(),
            LatencySla::NoLimit,
            peers.clone(),
        );
        let h = history(&[500.0, 520.0, 510.0], &[1, 1, 1]);

        assert_eq!(tracker.tick(&h), StabilityState::Stable);
        assert!(!tracker.state().is_done());

        peers.stable.store(true, Ordering::SeqCst);
        assert_eq!(
            tracker.tick(&h),
            StabilityState::Done(Completion::Success)
        );
    }
}
