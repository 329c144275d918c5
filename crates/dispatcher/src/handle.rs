//! ScheduleHandle - owns the armed timer tasks of one run

use std::sync::Arc;

use observability::RunningStats;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument};

use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::scheduler::FireReport;

/// Handle to the armed timers of one run
///
/// Dropping the handle aborts every timer that has not fired yet.
pub struct ScheduleHandle {
    tasks: JoinSet<FireReport>,
    scheduled: usize,
    metrics: Arc<DispatchMetrics>,
    reports: Vec<FireReport>,
    lateness_ms: RunningStats,
}

/// End-of-run view of a schedule
#[derive(Debug, Clone)]
pub struct ScheduleSummary {
    pub scheduled: usize,
    pub metrics: MetricsSnapshot,
    pub lateness_mean_ms: f64,
    pub lateness_max_ms: f64,
}

impl ScheduleHandle {
    pub(crate) fn new(
        tasks: JoinSet<FireReport>,
        scheduled: usize,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            tasks,
            scheduled,
            metrics,
            reports: Vec::with_capacity(scheduled),
            lateness_ms: RunningStats::default(),
        }
    }

    /// Timers armed
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    /// Timers not yet collected
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Reports of fired timers, in completion order
    pub fn reports(&self) -> &[FireReport] {
        &self.reports
    }

    /// Wait until every timer has fired
    ///
    /// Cancel-safe: dropping the future (e.g. in `select!`) loses no report.
    pub async fn join(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            self.collect(result);
        }
        debug!(collected = self.reports.len(), "all timers settled");
    }

    /// Abort every timer that has not fired; returns how many were cancelled
    #[instrument(name = "schedule_handle_cancel", skip(self), fields(pending = self.tasks.len()))]
    pub async fn cancel(&mut self) -> u64 {
        let before = self.metrics.snapshot().cancelled;

        self.tasks.abort_all();
        while let Some(result) = self.tasks.join_next().await {
            self.collect(result);
        }

        let cancelled = self.metrics.snapshot().cancelled - before;
        info!(cancelled, "pending timers cancelled");
        cancelled
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            scheduled: self.scheduled,
            metrics: self.metrics.snapshot(),
            lateness_mean_ms: self.lateness_ms.mean(),
            lateness_max_ms: self.lateness_ms.max(),
        }
    }

    fn collect(&mut self, result: Result<FireReport, JoinError>) {
        match result {
            Ok(report) => {
                self.lateness_ms.push(report.lateness.as_secs_f64() * 1000.0);
                self.reports.push(report);
            }
            Err(e) if e.is_cancelled() => {
                self.metrics.inc_cancelled();
                observability::record_event_dropped("cancelled");
            }
            Err(e) => {
                error!(error = %e, "timer task panicked");
                self.metrics.inc_failed();
            }
        }
    }
}
