//! Dispatch metrics for in-process reporting

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every armed timer
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Timers armed
    scheduled: AtomicU64,
    /// Events handed to a connection
    fired: AtomicU64,
    /// Events whose endpoint had no connection
    dropped: AtomicU64,
    /// Events whose publish or encoding failed
    failed: AtomicU64,
    /// Timers aborted before firing
    cancelled: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fired(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            fired: self.fired.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub scheduled: u64,
    pub fired: u64,
    pub dropped: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl MetricsSnapshot {
    /// Timers that reached a terminal state
    pub fn settled(&self) -> u64 {
        self.fired + self.dropped + self.failed + self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = DispatchMetrics::new();
        for _ in 0..3 {
            metrics.inc_scheduled();
        }
        metrics.inc_fired();
        metrics.inc_dropped();
        metrics.inc_cancelled();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.scheduled, 3);
        assert_eq!(snapshot.failed, 0);
        assert_eq!(snapshot.settled(), 3);
    }
}
