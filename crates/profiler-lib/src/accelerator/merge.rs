//! Merging telemetry snapshots from multiple sources
//!
//! Sources may disagree on which accelerators they report. Every field is
//! reduced only over the sources that reported that accelerator, so a
//! missing entry never counts as zero.

use crate::models::AcceleratorMetrics;
use std::collections::BTreeMap;

/// How values of one metric are combined across sources
pub trait Reduction<T> {
    type Acc;

    /// Accumulator for the first source that reported an accelerator
    fn start(&self, value: T) -> Self::Acc;

    /// Fold in a later source's value
    fn combine(&self, existing: Self::Acc, value: T) -> Self::Acc;

    fn finish(&self, acc: Self::Acc) -> T;
}

/// Arithmetic mean over reporting sources
#[derive(Debug, Clone, Copy, Default)]
pub struct Average;

impl Reduction<f64> for Average {
    type Acc = (f64, usize);

    fn start(&self, value: f64) -> Self::Acc {
        (value, 1)
    }

    fn combine(&self, (sum, count): Self::Acc, value: f64) -> Self::Acc {
        (sum + value, count + 1)
    }

    fn finish(&self, (sum, count): Self::Acc) -> f64 {
        sum / count as f64
    }
}

/// Largest value reported by any source
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl<T: PartialOrd> Reduction<T> for Max {
    type Acc = T;

    fn start(&self, value: T) -> T {
        value
    }

    fn combine(&self, existing: T, value: T) -> T {
        if value > existing {
            value
        } else {
            existing
        }
    }

    fn finish(&self, acc: T) -> T {
        acc
    }
}

/// Value from the first source that reported the accelerator
#[derive(Debug, Clone, Copy, Default)]
pub struct First;

impl<T> Reduction<T> for First {
    type Acc = T;

    fn start(&self, value: T) -> T {
        value
    }

    fn combine(&self, existing: T, _value: T) -> T {
        existing
    }

    fn finish(&self, acc: T) -> T {
        acc
    }
}

/// Reduce one metric keyed by accelerator id across source maps
pub fn reduce_per_accelerator<T, R>(
    sources: &[&BTreeMap<String, T>],
    reduction: &R,
) -> BTreeMap<String, T>
where
    T: Copy,
    R: Reduction<T>,
{
    let mut accumulated: BTreeMap<String, R::Acc> = BTreeMap::new();

    for source in sources {
        for (id, &value) in source.iter() {
            let acc = match accumulated.remove(id) {
                Some(existing) => reduction.combine(existing, value),
                None => reduction.start(value),
            };
            accumulated.insert(id.clone(), acc);
        }
    }

    accumulated
        .into_iter()
        .map(|(id, acc)| (id, reduction.finish(acc)))
        .collect()
}

/// Merge snapshots from all sources into one
///
/// Utilization and power are averaged, memory used takes the peak, and
/// memory total keeps the first value seen.
pub fn merge_metrics(snapshots: &[AcceleratorMetrics]) -> AcceleratorMetrics {
    let utilization: Vec<_> = snapshots.iter().map(|m| &m.utilization).collect();
    let power: Vec<_> = snapshots.iter().map(|m| &m.power_watts).collect();
    let memory_used: Vec<_> = snapshots.iter().map(|m| &m.memory_used_bytes).collect();
    let memory_total: Vec<_> = snapshots.iter().map(|m| &m.memory_total_bytes).collect();

    AcceleratorMetrics {
        utilization: reduce_per_accelerator(&utilization, &Average),
        power_watts: reduce_per_accelerator(&power, &Average),
        memory_used_bytes: reduce_per_accelerator(&memory_used, &Max),
        memory_total_bytes: reduce_per_accelerator(&memory_total, &First),
    }
}
