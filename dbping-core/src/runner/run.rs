use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::TICK;
use super::counters::{Counters, CountersSnapshot, WorkerKind};
use super::error::{Error, Result};
use super::progress::{ProgressFn, ProgressUpdate};
use super::signal::RunFlag;
use super::status::{DiagnosticFn, Diagnostics, run_status};
use super::summary::RunSummary;
use super::worker::{Probe, run_worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown future resolved (Ctrl-C or SIGTERM).
    Interrupted,
    /// A continuous worker finished while the run was still live.
    WorkerExited(WorkerKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub stop_reason: StopReason,
    pub summary: RunSummary,
    /// Snapshot taken at the last completed tick.
    pub last: CountersSnapshot,
}

/// Owns the workers and drives the one-second reporting tick.
#[derive(Debug)]
pub struct Controller {
    counters: Arc<Counters>,
    run: Arc<RunFlag>,
    workers: Vec<(WorkerKind, JoinHandle<()>)>,
    status: Option<JoinHandle<()>>,
}

impl Controller {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            run: Arc::new(RunFlag::new()),
            workers: Vec::new(),
            status: None,
        }
    }

    /// Starts a continuous worker. It begins executing immediately, before [`Controller::run`].
    pub fn spawn_worker<P: Probe>(&mut self, kind: WorkerKind, probe: P) -> Result<()> {
        if !kind.is_continuous() {
            return Err(Error::NotContinuous(kind));
        }
        if self.workers.iter().any(|(k, _)| *k == kind) {
            return Err(Error::DuplicateWorker(kind));
        }

        let slot = self.counters.slot(kind);
        let run = self.run.clone();
        let handle = tokio::spawn(run_worker(probe, slot, run));
        self.workers.push((kind, handle));
        Ok(())
    }

    /// Starts the one-shot status worker. It is not waited for on shutdown.
    pub fn spawn_status<D: Diagnostics>(
        &mut self,
        diagnostics: D,
        report: Option<DiagnosticFn>,
    ) -> Result<()> {
        if self.status.is_some() {
            return Err(Error::DuplicateWorker(WorkerKind::Status));
        }

        let slot = self.counters.slot(WorkerKind::Status);
        self.status = Some(tokio::spawn(run_status(diagnostics, slot, report)));
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }

    /// Ticks once per second until `shutdown` resolves or a continuous worker exits.
    ///
    /// Each tick advances the tick counter, snapshots all slots and hands the update to
    /// `progress`. The summary is built from the last tick's snapshot.
    pub async fn run<S>(mut self, shutdown: S, progress: Option<ProgressFn>) -> Result<RunOutcome>
    where
        S: Future<Output = ()>,
    {
        if self.workers.is_empty() {
            return Err(Error::NoWorkers);
        }

        let started = Instant::now();
        let mut interval = tokio::time::interval_at(started + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::debug!(workers = self.workers.len(), "controller running");

        let mut prev = self.counters.snapshot();
        let stop_reason = loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break StopReason::Interrupted,
                _ = interval.tick() => {}
            }

            self.counters.advance_tick();
            let now = self.counters.snapshot();
            if let Some(progress) = &progress {
                (progress)(ProgressUpdate::from_snapshots(
                    &now,
                    &prev,
                    started.elapsed(),
                ));
            }
            prev = now;

            if let Some(kind) = self.exited_worker() {
                tracing::error!(worker = %kind, "{kind} worker exited unexpectedly");
                break StopReason::WorkerExited(kind);
            }
        };

        tracing::debug!(?stop_reason, "controller stopping");
        let elapsed = started.elapsed();
        self.shutdown().await;
        tracing::debug!("controller terminated");

        Ok(RunOutcome {
            stop_reason,
            summary: RunSummary::from_snapshot(&prev, elapsed),
            last: prev,
        })
    }

    fn exited_worker(&self) -> Option<WorkerKind> {
        self.workers
            .iter()
            .find(|(_, handle)| handle.is_finished())
            .map(|(kind, _)| *kind)
    }

    async fn shutdown(&mut self) {
        self.run.stop();

        for (kind, handle) in std::mem::take(&mut self.workers) {
            match handle.await {
                Ok(()) => {}
                Err(err) if err.is_panic() => {
                    tracing::error!(worker = %kind, "{kind} worker panicked");
                }
                Err(err) => tracing::debug!(worker = %kind, "{kind} worker cancelled: {err}"),
            }
        }

        if let Some(status) = self.status.take() {
            if !status.is_finished() {
                tracing::debug!("status worker still running, aborting");
                status.abort();
            }
            let _ = status.await;
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.run.stop();
        for (_, handle) in &self.workers {
            handle.abort();
        }
        if let Some(status) = &self.status {
            status.abort();
        }
    }
}
