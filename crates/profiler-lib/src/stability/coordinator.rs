//! Cross-process agreement on stability
//!
//! When several profiler processes drive the same endpoint, a window only
//! counts as stable once every process reports a stable window. The core
//! asks an injected coordinator rather than talking to peers itself.

/// Combines the local stability verdict with those of cooperating processes
pub trait StabilityCoordinator: Send + Sync {
    /// Returns true only if this process and all of its peers are stable
    fn all_stable(&self, locally_stable: bool) -> bool;
}

/// Coordinator for a profiler running alone
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl StabilityCoordinator for SingleProcess {
    fn all_stable(&self, locally_stable: bool) -> bool {
        locally_stable
    }
}
