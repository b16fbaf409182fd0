use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;

use super::TICK;
use super::counters::StatsSlot;
use super::signal::RunFlag;

/// What a successful operation reports back to its worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Identity of the session the operation ran on.
    pub connection_id: u64,
    pub extra: Option<i64>,
}

impl Observation {
    #[must_use]
    pub fn new(connection_id: u64) -> Self {
        Self {
            connection_id,
            extra: None,
        }
    }

    #[must_use]
    pub fn with_extra(mut self, extra: i64) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// One class of database operation, executed once per worker cycle on a dedicated connection.
pub trait Probe: Send + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&mut self) -> impl Future<Output = Result<Observation, Self::Error>> + Send;

    /// Releases the connection. Called once, after the last cycle.
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// Continuous worker loop: execute, record, pace, until the run flag is cleared.
///
/// Operation errors are logged and counted, never propagated. An in-flight operation is
/// always allowed to finish; only the pacing sleep is cut short on stop.
pub(crate) async fn run_worker<P: Probe>(mut probe: P, slot: StatsSlot, run: Arc<RunFlag>) {
    let kind = slot.kind();
    tracing::debug!(worker = %kind, "worker started");

    let mut pacer = Pacer::new(Instant::now());
    while run.is_running() {
        let started = Instant::now();
        let result = probe.execute().await;
        let elapsed = started.elapsed();

        let reconnected = slot.update(|stats| {
            let reconnected = match &result {
                Ok(obs) => {
                    if obs.extra.is_some() {
                        stats.extra = obs.extra;
                    }
                    stats.observe_connection(obs.connection_id)
                }
                Err(_) => false,
            };
            stats.complete_cycle(elapsed, result.is_err());
            reconnected
        });

        match &result {
            Err(err) => tracing::warn!(
                worker = %kind,
                "{kind} failed after {:.2} seconds with error: {err}",
                elapsed.as_secs_f64()
            ),
            Ok(obs) if reconnected => tracing::info!(
                worker = %kind,
                connection_id = obs.connection_id,
                "{kind} connection re-established"
            ),
            Ok(_) => {}
        }

        if let Some(deadline) = pacer.next_start(Instant::now()) {
            run.sleep_until(deadline).await;
        }
    }

    probe.close().await;
    tracing::debug!(worker = %kind, "worker stopped");
}

/// Cycle starts on a fixed one-second grid, so timer overshoot never accumulates.
///
/// A cycle that overruns its slot moves the grid to the moment it finished; the next cycle
/// then starts right away.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pacer {
    next: Instant,
}

impl Pacer {
    pub(crate) fn new(first_start: Instant) -> Self {
        Self { next: first_start }
    }

    /// Deadline for the next cycle start, or `None` when it is already due.
    pub(crate) fn next_start(&mut self, now: Instant) -> Option<Instant> {
        self.next += TICK;
        if self.next <= now {
            self.next = now;
            return None;
        }
        Some(self.next)
    }
}
