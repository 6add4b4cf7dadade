//! Latency statistics
//!
//! Mean and standard deviation over nanosecond latency samples. Samples can
//! run into the billions of nanoseconds, so squaring them overflows `u64`;
//! the variance is accumulated with Welford's online algorithm, which only
//! ever squares the (bounded) deviation from the running mean.

use crate::error::{ProfilerError, Result};
use serde::{Deserialize, Serialize};

const NANOS_PER_MICRO: f64 = 1_000.0;

/// Reported in place of a standard deviation that cannot be estimated
pub const UNDEFINED_STD_DEV_US: u64 = u64::MAX;

/// Mean and standard deviation of a set of latencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Arithmetic mean, truncated to whole nanoseconds
    pub mean_ns: u64,
    /// Sample standard deviation, truncated to whole microseconds
    ///
    /// [`UNDEFINED_STD_DEV_US`] when only one sample was available.
    pub std_dev_us: u64,
}

impl LatencyStats {
    pub fn has_std_dev(&self) -> bool {
        self.std_dev_us != UNDEFINED_STD_DEV_US
    }
}

/// Latency percentiles in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
}

/// Compute mean (ns) and sample standard deviation (µs)
pub fn latency_stats(latencies: &[u64]) -> Result<LatencyStats> {
    if latencies.is_empty() {
        return Err(ProfilerError::domain(
            "cannot compute latency statistics over zero samples",
        ));
    }

    // u128 cannot overflow for any realistic sample count.
    let sum: u128 = latencies.iter().map(|&l| u128::from(l)).sum();
    let mean_ns = (sum / latencies.len() as u128) as u64;

    if latencies.len() == 1 {
        return Ok(LatencyStats {
            mean_ns,
            std_dev_us: UNDEFINED_STD_DEV_US,
        });
    }

    let mut welford = Welford::default();
    for &latency in latencies {
        welford.add(latency as f64);
    }
    let std_dev_ns = welford.sample_variance().sqrt();

    Ok(LatencyStats {
        mean_ns,
        std_dev_us: (std_dev_ns / NANOS_PER_MICRO) as u64,
    })
}

/// Compute p50/p90/p95/p99 over a sorted copy of the samples
pub fn latency_percentiles(latencies: &[u64]) -> Result<LatencyPercentiles> {
    if latencies.is_empty() {
        return Err(ProfilerError::domain(
            "cannot compute latency percentiles over zero samples",
        ));
    }

    let mut sorted = latencies.to_vec();
    sorted.sort_unstable();

    Ok(LatencyPercentiles {
        p50_ns: percentile(&sorted, 50.0),
        p90_ns: percentile(&sorted, 90.0),
        p95_ns: percentile(&sorted, 95.0),
        p99_ns: percentile(&sorted, 99.0),
    })
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Welford's single-pass mean/variance accumulator
#[derive(Debug, Default, Clone, Copy)]
struct Welford {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Welford {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Unbiased (n - 1) variance; zero below two samples
    fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2 / (self.count - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_latencies() {
        let stats = latency_stats(&[100_000, 200_000, 50_000]).unwrap();
        assert_eq!(stats.mean_ns, 116_666);
        assert_eq!(stats.std_dev_us, 76);
    }

    #[test]
    fn test_big_latencies_do_not_overflow() {
        // Squaring any of these exceeds u64::MAX.
        let stats = latency_stats(&[4_300_000_000, 4_400_000_000, 5_000_000_000]).unwrap();
        assert_eq!(stats.mean_ns, 4_566_666_666);
        assert_eq!(stats.std_dev_us, 378_593);
    }

    #[test]
    fn test_single_latency_has_undefined_std_dev() {
        let stats = latency_stats(&[100]).unwrap();
        assert_eq!(stats.mean_ns, 100);
        assert_eq!(stats.std_dev_us, u64::MAX);
        assert!(!stats.has_std_dev());
    }

    #[test]
    fn test_empty_latencies_is_domain_error() {
        assert!(matches!(latency_stats(&[]), Err(ProfilerError::Domain(_))));
        assert!(matches!(
            latency_percentiles(&[]),
            Err(ProfilerError::Domain(_))
        ));
    }

    #[test]
    fn test_matches_two_pass_formula() {
        let samples: Vec<u64> = (1..=50).map(|i| i * 37_000 + (i % 7) * 1_000).collect();
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<u64>() as f64 / n;
        let variance = samples
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        let expected_us = (variance.sqrt() / 1_000.0) as u64;

        let stats = latency_stats(&samples).unwrap();
        assert!(stats.std_dev_us.abs_diff(expected_us) <= 1);
        assert_eq!(stats.mean_ns, mean as u64);
    }

    #[test]
    fn test_identical_samples_have_zero_std_dev() {
        let stats = latency_stats(&[7_000_000_000; 4]).unwrap();
        assert_eq!(stats.mean_ns, 7_000_000_000);
        assert_eq!(stats.std_dev_us, 0);
    }

    #[test]
    fn test_percentiles() {
        let samples: Vec<u64> = (1..=100).rev().collect();
        let p = latency_percentiles(&samples).unwrap();
        assert_eq!(p.p50_ns, 51);
        assert_eq!(p.p90_ns, 90);
        assert_eq!(p.p95_ns, 95);
        assert_eq!(p.p99_ns, 99);

        let single = latency_percentiles(&[42]).unwrap();
        assert_eq!(single.p50_ns, 42);
        assert_eq!(single.p99_ns, 42);
    }
}
