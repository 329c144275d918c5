//! Run statistics.

use std::time::Duration;

use dispatcher::ScheduleSummary;

/// Why the replay stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every armed event fired
    AllFired,
    /// `--timeout` elapsed first
    Timeout,
    /// Ctrl+C / SIGTERM
    Interrupted,
}

/// Statistics from a replay run
#[derive(Debug, Clone)]
pub struct RunStats {
    pub stakeholders: usize,
    pub artifacts: usize,
    pub excluded_artifacts: usize,
    pub instances_announced: usize,
    pub brokers_connected: usize,
    pub streams_failed: usize,
    pub events_loaded: usize,
    pub lines_skipped: usize,
    pub events_scheduled: u64,
    pub events_fired: u64,
    pub events_dropped: u64,
    pub events_failed: u64,
    pub events_cancelled: u64,
    pub lateness_mean_ms: f64,
    pub lateness_max_ms: f64,
    pub duration: Duration,
    pub completion: Completion,
}

impl RunStats {
    pub(crate) fn apply_schedule(&mut self, summary: &ScheduleSummary) {
        self.events_scheduled = summary.metrics.scheduled;
        self.events_fired = summary.metrics.fired;
        self.events_dropped = summary.metrics.dropped;
        self.events_failed = summary.metrics.failed;
        self.events_cancelled = summary.metrics.cancelled;
        self.lateness_mean_ms = summary.lateness_mean_ms;
        self.lateness_max_ms = summary.lateness_max_ms;
    }

    /// Events per second over the run
    pub fn fire_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_fired as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Replay Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Completion: {:?}", self.completion);
        println!("   ├─ Stakeholders: {}", self.stakeholders);
        println!("   ├─ Artifacts: {} ({} excluded)", self.artifacts, self.excluded_artifacts);
        println!("   ├─ Instances announced: {}", self.instances_announced);
        println!("   └─ Brokers connected: {}", self.brokers_connected);

        println!("\nStreams");
        println!("   ├─ Events loaded: {}", self.events_loaded);
        println!("   ├─ Lines skipped: {}", self.lines_skipped);
        println!("   └─ Unreadable files: {}", self.streams_failed);

        println!("\nDispatch");
        println!("   ├─ Scheduled: {}", self.events_scheduled);
        println!("   ├─ Fired: {} ({:.2}/s)", self.events_fired, self.fire_rate());
        println!("   ├─ Dropped (unknown broker): {}", self.events_dropped);
        println!("   ├─ Failed: {}", self.events_failed);
        println!("   ├─ Cancelled: {}", self.events_cancelled);
        println!(
            "   └─ Fire lateness: mean {:.2}ms, max {:.2}ms",
            self.lateness_mean_ms, self.lateness_max_ms
        );

        println!();
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            stakeholders: 0,
            artifacts: 0,
            excluded_artifacts: 0,
            instances_announced: 0,
            brokers_connected: 0,
            streams_failed: 0,
            events_loaded: 0,
            lines_skipped: 0,
            events_scheduled: 0,
            events_fired: 0,
            events_dropped: 0,
            events_failed: 0,
            events_cancelled: 0,
            lateness_mean_ms: 0.0,
            lateness_max_ms: 0.0,
            duration: Duration::ZERO,
            completion: Completion::AllFired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_rate() {
        let stats = RunStats {
            events_fired: 50,
            duration: Duration::from_secs(10),
            ..Default::default()
        };
        assert!((stats.fire_rate() - 5.0).abs() < 1e-9);
        assert_eq!(RunStats::default().fire_rate(), 0.0);
    }

    #[test]
    fn test_apply_schedule() {
        let mut stats = RunStats::default();
        stats.apply_schedule(&ScheduleSummary {
            scheduled: 4,
            metrics: dispatcher::MetricsSnapshot {
                scheduled: 4,
                fired: 2,
                dropped: 1,
                failed: 0,
                cancelled: 1,
            },
            lateness_mean_ms: 1.5,
            lateness_max_ms: 3.0,
        });
        assert_eq!(stats.events_scheduled, 4);
        assert_eq!(stats.events_cancelled, 1);
        assert_eq!(stats.lateness_max_ms, 3.0);
    }
}
