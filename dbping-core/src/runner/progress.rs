use std::time::Duration;

use super::counters::{CountersSnapshot, WorkerKind};

/// One controller tick, derived from the current and the previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Monotonic tick counter (1-based).
    pub tick: u64,
    pub elapsed: Duration,

    /// Latest ping latency; zero when the ping worker did not complete a cycle this tick.
    pub ping_latency: Duration,
    pub ping_stalled: bool,

    /// Sessions opened so far across the continuous workers.
    pub connects: u64,

    /// Workers whose connection was re-established since the previous tick.
    pub reconnected: Vec<WorkerKind>,

    pub snapshot: CountersSnapshot,
}

impl ProgressUpdate {
    #[must_use]
    pub fn from_snapshots(
        now: &CountersSnapshot,
        prev: &CountersSnapshot,
        elapsed: Duration,
    ) -> Self {
        let ping_now = now.worker(WorkerKind::Ping);
        let ping_stalled = ping_now.sequence == prev.worker(WorkerKind::Ping).sequence;
        let ping_latency = if ping_stalled {
            Duration::ZERO
        } else {
            ping_now.last_latency
        };

        let reconnected = WorkerKind::CONTINUOUS
            .into_iter()
            .filter(|k| now.worker(*k).reconnect_count > prev.worker(*k).reconnect_count)
            .collect();

        Self {
            tick: now.tick,
            elapsed,
            ping_latency,
            ping_stalled,
            connects: now.connects(),
            reconnected,
            snapshot: *now,
        }
    }
}

pub type ProgressFn = std::sync::Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::counters::WorkerStats;

    fn ping(sequence: u64, latency_ms: u64) -> WorkerStats {
        WorkerStats {
            connection_id: Some(1),
            sequence,
            last_latency: Duration::from_millis(latency_ms),
            ..WorkerStats::default()
        }
    }

    #[test]
    fn reports_latest_ping_latency() {
        let prev = CountersSnapshot::default().with_worker(WorkerKind::Ping, ping(1, 12));
        let now = CountersSnapshot::default().with_worker(WorkerKind::Ping, ping(2, 15));

        let u = ProgressUpdate::from_snapshots(&now, &prev, Duration::from_secs(2));
        assert_eq!(u.ping_latency, Duration::from_millis(15));
        assert!(!u.ping_stalled);
        assert_eq!(u.connects, 1);
        assert!(u.reconnected.is_empty());
    }

    #[test]
    fn stalled_ping_shows_zero() {
        let prev = CountersSnapshot::default().with_worker(WorkerKind::Ping, ping(4, 12));
        let now = CountersSnapshot::default().with_worker(WorkerKind::Ping, ping(4, 12));

        let u = ProgressUpdate::from_snapshots(&now, &prev, Duration::from_secs(5));
        assert_eq!(u.ping_latency, Duration::ZERO);
        assert!(u.ping_stalled);
    }

    #[test]
    fn lists_workers_that_reconnected() {
        let before = WorkerStats {
            connection_id: Some(7),
            ..WorkerStats::default()
        };
        let after = WorkerStats {
            connection_id: Some(8),
            reconnect_count: 1,
            ..WorkerStats::default()
        };
        let prev = CountersSnapshot::default().with_worker(WorkerKind::Write, before);
        let now = CountersSnapshot::default().with_worker(WorkerKind::Write, after);

        let u = ProgressUpdate::from_snapshots(&now, &prev, Duration::from_secs(2));
        assert_eq!(u.reconnected, vec![WorkerKind::Write]);
        assert_eq!(u.connects, 2);
    }
}
