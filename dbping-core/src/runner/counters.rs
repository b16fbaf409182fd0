use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// The class of database operation a worker performs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum WorkerKind {
    Ping,
    Read,
    Write,
    Status,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 4] = [Self::Ping, Self::Read, Self::Write, Self::Status];

    /// Kinds that loop until the run flag is cleared.
    pub const CONTINUOUS: [WorkerKind; 3] = [Self::Ping, Self::Read, Self::Write];

    #[must_use]
    pub fn is_continuous(self) -> bool {
        !matches!(self, Self::Status)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-worker counters. Exactly one worker writes a given slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkerStats {
    /// Identity of the underlying session, `None` until the first successful operation.
    pub connection_id: Option<u64>,
    pub reconnect_count: u64,
    /// Completed cycles, successful or not.
    pub sequence: u64,
    pub last_latency: Duration,
    /// Worker specific value, display only.
    pub extra: Option<i64>,

    pub failures: u64,
    pub latency_min: Option<Duration>,
    pub latency_max: Duration,
    pub latency_total: Duration,
}

impl WorkerStats {
    /// Records the connection identity seen by a successful operation.
    ///
    /// The first identity is the baseline; every later change counts as one reconnect.
    /// Returns `true` when a reconnect was counted.
    pub fn observe_connection(&mut self, connection_id: u64) -> bool {
        match self.connection_id.replace(connection_id) {
            None => false,
            Some(prev) if prev == connection_id => false,
            Some(_) => {
                self.reconnect_count = self.reconnect_count.saturating_add(1);
                true
            }
        }
    }

    /// Closes one cycle: latency is recorded on success and failure alike.
    pub fn complete_cycle(&mut self, latency: Duration, failed: bool) {
        self.last_latency = latency;
        self.latency_total = self.latency_total.saturating_add(latency);
        self.latency_max = self.latency_max.max(latency);
        self.latency_min = Some(self.latency_min.map_or(latency, |min| min.min(latency)));
        if failed {
            self.failures = self.failures.saturating_add(1);
        }
        self.sequence = self.sequence.saturating_add(1);
    }

    #[must_use]
    pub fn latency_avg(&self) -> Option<Duration> {
        if self.sequence == 0 {
            return None;
        }
        let n = u32::try_from(self.sequence).unwrap_or(u32::MAX);
        Some(self.latency_total / n)
    }

    /// Distinct sessions this worker has used so far.
    #[must_use]
    pub fn connects(&self) -> u64 {
        u64::from(self.connection_id.is_some()).saturating_add(self.reconnect_count)
    }
}

/// Shared counters: one lock per worker slot plus the controller's tick.
#[derive(Debug, Default)]
pub struct Counters {
    slots: [Mutex<WorkerStats>; 4],
    tick: AtomicU64,
}

impl Counters {
    /// Hands out the write side of one slot.
    pub fn slot(self: &Arc<Self>, kind: WorkerKind) -> StatsSlot {
        StatsSlot {
            counters: self.clone(),
            kind,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }

    pub fn advance_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    /// Copies every slot. Each slot is copied whole, so a cycle is never observed half-written.
    pub fn snapshot(&self) -> CountersSnapshot {
        let mut workers = [WorkerStats::default(); 4];
        for kind in WorkerKind::ALL {
            workers[kind.index()] = *self.slots[kind.index()].lock();
        }
        CountersSnapshot {
            tick: self.tick(),
            workers,
        }
    }
}

/// Write handle for a single worker slot.
#[derive(Debug)]
pub struct StatsSlot {
    counters: Arc<Counters>,
    kind: WorkerKind,
}

impl StatsSlot {
    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut WorkerStats) -> R) -> R {
        let mut stats = self.counters.slots[self.kind.index()].lock();
        f(&mut stats)
    }
}

/// Immutable copy of [`Counters`] taken by the controller once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CountersSnapshot {
    pub tick: u64,
    workers: [WorkerStats; 4],
}

impl CountersSnapshot {
    /// Empty snapshot at `tick`, for building reports outside a live run.
    #[must_use]
    pub fn at_tick(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn worker(&self, kind: WorkerKind) -> &WorkerStats {
        &self.workers[kind.index()]
    }

    #[must_use]
    pub fn with_worker(mut self, kind: WorkerKind, stats: WorkerStats) -> Self {
        self.workers[kind.index()] = stats;
        self
    }

    /// `100 * sequence / tick`, with `sequence` capped at `tick`.
    #[must_use]
    pub fn sla_pct(&self, kind: WorkerKind) -> Option<f64> {
        if self.tick == 0 {
            return None;
        }
        let done = self.worker(kind).sequence.min(self.tick);
        Some(100.0 * (done as f64) / (self.tick as f64))
    }

    /// Sessions opened across all workers, the status session included.
    #[must_use]
    pub fn connects(&self) -> u64 {
        WorkerKind::ALL
            .iter()
            .map(|k| self.worker(*k).connects())
            .sum()
    }
}
