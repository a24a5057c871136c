use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle counters
#[derive(Debug, Default)]
pub(crate) struct LifecycleCounters {
    pub reused: AtomicU64,
    pub flights_started: AtomicU64,
    pub flights_joined: AtomicU64,
    pub failures: AtomicU64,
}

impl LifecycleCounters {
    pub fn snapshot(&self) -> LifecycleStats {
        LifecycleStats {
            reused: self.reused.load(Ordering::Relaxed),
            flights_started: self.flights_started.load(Ordering::Relaxed),
            flights_joined: self.flights_joined.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of the manager's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    /// `ensure_valid` calls answered from the cache
    pub reused: u64,
    /// Authority calls started (issue or verify)
    pub flights_started: u64,
    /// Callers that attached to a flight another caller started
    pub flights_joined: u64,
    /// Flights that ended in an error
    pub failures: u64,
}
