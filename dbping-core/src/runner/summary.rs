use std::time::Duration;

use super::counters::{CountersSnapshot, WorkerKind};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSummary {
    pub kind: WorkerKind,
    pub sequence: u64,
    /// `None` when no tick completed.
    pub sla_pct: Option<f64>,
    pub failures: u64,
    pub reconnects: u64,
    pub latency_min: Option<Duration>,
    pub latency_avg: Option<Duration>,
    pub latency_max: Option<Duration>,
    pub extra: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub ticks: u64,
    pub workers: Vec<WorkerSummary>,
}

impl RunSummary {
    /// Builds the final report for the continuous workers.
    #[must_use]
    pub fn from_snapshot(snapshot: &CountersSnapshot, elapsed: Duration) -> Self {
        let workers = WorkerKind::CONTINUOUS
            .into_iter()
            .map(|kind| {
                let s = snapshot.worker(kind);
                WorkerSummary {
                    kind,
                    sequence: s.sequence,
                    sla_pct: snapshot.sla_pct(kind),
                    failures: s.failures,
                    reconnects: s.reconnect_count,
                    latency_min: s.latency_min,
                    latency_avg: s.latency_avg(),
                    latency_max: (s.sequence > 0).then_some(s.latency_max),
                    extra: s.extra,
                }
            })
            .collect();

        Self {
            elapsed,
            ticks: snapshot.tick,
            workers,
        }
    }

    #[must_use]
    pub fn worker(&self, kind: WorkerKind) -> Option<&WorkerSummary> {
        self.workers.iter().find(|w| w.kind == kind)
    }

    /// Share of all continuous-worker operations that succeeded, in percent.
    #[must_use]
    pub fn availability_pct(&self) -> Option<f64> {
        let total: u64 = self.workers.iter().map(|w| w.sequence).sum();
        if total == 0 {
            return None;
        }
        let failed: u64 = self.workers.iter().map(|w| w.failures).sum();
        Some(100.0 * (total.saturating_sub(failed) as f64) / (total as f64))
    }
}
