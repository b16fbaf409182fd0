use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dbping_core::{
    Controller, Diagnostic, DiagnosticFn, DiagnosticKind, Diagnostics, Observation, Probe,
    ProgressFn, ProgressUpdate, StopReason, WorkerKind,
};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, thiserror::Error)]
#[error("scripted failure on call {0}")]
struct ScriptedError(u64);

/// Fake probe whose latency and session identity are scripted per call (1-based).
struct Scripted {
    calls: u64,
    latency: Duration,
    identity: fn(u64) -> u64,
    fail_on: Option<u64>,
    panic_on: Option<u64>,
    starts: Arc<Mutex<Vec<Instant>>>,
    closed: Arc<AtomicBool>,
}

impl Scripted {
    fn new(latency: Duration) -> Self {
        Self {
            calls: 0,
            latency,
            identity: |_| 1,
            fail_on: None,
            panic_on: None,
            starts: Arc::default(),
            closed: Arc::default(),
        }
    }
}

impl Probe for Scripted {
    type Error = ScriptedError;

    async fn execute(&mut self) -> Result<Observation, ScriptedError> {
        self.calls += 1;
        self.starts.lock().push(Instant::now());
        tokio::time::sleep(self.latency).await;

        if self.panic_on == Some(self.calls) {
            panic!("scripted panic on call {}", self.calls);
        }
        if self.fail_on == Some(self.calls) {
            return Err(ScriptedError(self.calls));
        }
        Ok(Observation::new((self.identity)(self.calls)).with_extra(self.calls as i64))
    }

    async fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn collector() -> (ProgressFn, Arc<Mutex<Vec<ProgressUpdate>>>) {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::default();
    let sink = updates.clone();
    let progress: ProgressFn = Arc::new(move |u| sink.lock().push(u));
    (progress, updates)
}

fn spawn(controller: &mut Controller, kind: WorkerKind, probe: Scripted) {
    controller
        .spawn_worker(kind, probe)
        .unwrap_or_else(|e| panic!("spawn {kind} failed: {e}"));
}

#[tokio::test(start_paused = true)]
async fn three_ticks_with_fast_workers() {
    let mut controller = Controller::new();
    let ping = Scripted::new(Duration::from_millis(10));
    let closed = ping.closed.clone();
    spawn(&mut controller, WorkerKind::Ping, ping);
    spawn(&mut controller, WorkerKind::Read, Scripted::new(Duration::from_millis(20)));
    spawn(&mut controller, WorkerKind::Write, Scripted::new(Duration::from_millis(30)));

    let (progress, updates) = collector();
    let outcome = controller
        .run(tokio::time::sleep(Duration::from_millis(3500)), Some(progress))
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    assert_eq!(outcome.stop_reason, StopReason::Interrupted);
    assert!(closed.load(Ordering::SeqCst));

    let updates = updates.lock().clone();
    let ticks: Vec<u64> = updates.iter().map(|u| u.tick).collect();
    assert_eq!(ticks, vec![1, 2, 3]);

    for u in &updates {
        assert_eq!(u.ping_latency, Duration::from_millis(10));
        assert!(!u.ping_stalled);
        assert_eq!(u.connects, 3);
        assert!(u.reconnected.is_empty());
        let expected = Duration::from_secs(u.tick);
        assert!(
            u.elapsed >= expected && u.elapsed < expected + Duration::from_millis(10),
            "tick {} at {:?}",
            u.tick,
            u.elapsed
        );
    }

    assert_eq!(outcome.summary.ticks, 3);
    for w in &outcome.summary.workers {
        assert_eq!(w.sequence, 3, "{}", w.kind);
        assert_eq!(w.reconnects, 0, "{}", w.kind);
        assert_eq!(w.failures, 0, "{}", w.kind);
        assert_eq!(w.sla_pct, Some(100.0), "{}", w.kind);
        assert_eq!(w.extra, Some(3), "{}", w.kind);
    }
}

#[tokio::test(start_paused = true)]
async fn write_reconnect_is_reported_on_the_next_tick() {
    let mut controller = Controller::new();
    spawn(&mut controller, WorkerKind::Ping, Scripted::new(Duration::from_millis(5)));
    let mut write = Scripted::new(Duration::from_millis(10));
    write.identity = |call| if call >= 2 { 2 } else { 1 };
    spawn(&mut controller, WorkerKind::Write, write);

    let (progress, updates) = collector();
    let outcome = controller
        .run(tokio::time::sleep(Duration::from_millis(3500)), Some(progress))
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    let updates = updates.lock().clone();
    assert_eq!(updates.len(), 3);
    assert!(updates[0].reconnected.is_empty());
    assert_eq!(updates[0].connects, 2);
    assert_eq!(updates[1].reconnected, vec![WorkerKind::Write]);
    assert_eq!(updates[1].connects, 3);
    assert!(updates[2].reconnected.is_empty());

    let write = outcome
        .summary
        .worker(WorkerKind::Write)
        .unwrap_or_else(|| panic!("missing write summary"));
    assert_eq!(write.reconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn crashed_worker_ends_the_run() {
    let mut controller = Controller::new();
    let mut ping = Scripted::new(Duration::from_millis(10));
    ping.panic_on = Some(3);
    spawn(&mut controller, WorkerKind::Ping, ping);
    spawn(&mut controller, WorkerKind::Read, Scripted::new(Duration::from_millis(10)));

    let (progress, updates) = collector();
    let outcome = controller
        .run(std::future::pending::<()>(), Some(progress))
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    assert_eq!(outcome.stop_reason, StopReason::WorkerExited(WorkerKind::Ping));

    let updates = updates.lock().clone();
    assert_eq!(updates.len(), 3);
    assert!(updates[2].ping_stalled);
    assert_eq!(updates[2].ping_latency, Duration::ZERO);

    let ping = outcome
        .summary
        .worker(WorkerKind::Ping)
        .unwrap_or_else(|| panic!("missing ping summary"));
    assert_eq!(ping.sequence, 2);
    let sla = ping.sla_pct.unwrap_or_else(|| panic!("missing sla"));
    assert!((sla - 66.666).abs() < 0.01, "sla {sla}");
}

#[tokio::test(start_paused = true)]
async fn failed_operations_still_complete_a_cycle() {
    let mut controller = Controller::new();
    let mut read = Scripted::new(Duration::from_millis(10));
    read.fail_on = Some(2);
    spawn(&mut controller, WorkerKind::Read, read);

    let outcome = controller
        .run(tokio::time::sleep(Duration::from_millis(3500)), None)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    let read = outcome
        .summary
        .worker(WorkerKind::Read)
        .unwrap_or_else(|| panic!("missing read summary"));
    assert_eq!(read.sequence, 3);
    assert_eq!(read.failures, 1);
    assert_eq!(read.sla_pct, Some(100.0));
    assert_eq!(outcome.summary.availability_pct().map(|p| p.round()), Some(67.0));
}

#[tokio::test(start_paused = true)]
async fn fast_workers_start_once_per_second() {
    let mut controller = Controller::new();
    let ping = Scripted::new(Duration::from_millis(10));
    let starts = ping.starts.clone();
    spawn(&mut controller, WorkerKind::Ping, ping);

    controller
        .run(tokio::time::sleep(Duration::from_millis(3500)), None)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    let starts = starts.lock().clone();
    assert_eq!(starts.len(), 4);
    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= Duration::from_secs(1) && gap <= Duration::from_millis(1002),
            "gap {gap:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn slow_workers_run_back_to_back_and_finish_in_flight_work() {
    let mut controller = Controller::new();
    let read = Scripted::new(Duration::from_millis(1500));
    let starts = read.starts.clone();
    spawn(&mut controller, WorkerKind::Read, read);

    let begun = Instant::now();
    let outcome = controller
        .run(tokio::time::sleep(Duration::from_millis(4200)), None)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    // The third operation started at 3.0s and is allowed to finish.
    assert!(begun.elapsed() >= Duration::from_millis(4500));

    let starts = starts.lock().clone();
    assert_eq!(starts.len(), 3);
    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= Duration::from_millis(1500) && gap <= Duration::from_millis(1502),
            "gap {gap:?}"
        );
    }

    let read = outcome
        .summary
        .worker(WorkerKind::Read)
        .unwrap_or_else(|| panic!("missing read summary"));
    assert_eq!(outcome.summary.ticks, 4);
    assert_eq!(read.sequence, 2);
    assert_eq!(read.sla_pct, Some(50.0));
}

#[tokio::test(start_paused = true)]
async fn no_progress_after_shutdown() {
    let mut controller = Controller::new();
    spawn(&mut controller, WorkerKind::Ping, Scripted::new(Duration::from_millis(10)));

    let (progress, updates) = collector();
    controller
        .run(tokio::time::sleep(Duration::from_millis(2500)), Some(progress))
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    let before = updates.lock().len();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(before, 2);
    assert_eq!(updates.lock().len(), before);
}

struct FakeDiagnostics {
    hang_on: Option<DiagnosticKind>,
    closed: Arc<AtomicBool>,
}

impl Diagnostics for FakeDiagnostics {
    type Error = ScriptedError;

    async fn query(&mut self, kind: DiagnosticKind) -> Result<String, ScriptedError> {
        if self.hang_on == Some(kind) {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        match kind {
            DiagnosticKind::ServerHostname => Err(ScriptedError(0)),
            other => Ok(format!("{other:?}").to_lowercase()),
        }
    }

    fn connection_id(&self) -> Option<u64> {
        Some(99)
    }

    async fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn status_worker_reports_once_and_is_not_counted() {
    let mut controller = Controller::new();
    spawn(&mut controller, WorkerKind::Ping, Scripted::new(Duration::from_millis(10)));

    let reported: Arc<Mutex<Vec<Diagnostic>>> = Arc::default();
    let sink = reported.clone();
    let report: DiagnosticFn = Arc::new(move |d| sink.lock().push(d));
    let closed = Arc::new(AtomicBool::new(false));
    controller
        .spawn_status(
            FakeDiagnostics {
                hang_on: None,
                closed: closed.clone(),
            },
            Some(report),
        )
        .unwrap_or_else(|e| panic!("spawn status failed: {e}"));

    let outcome = controller
        .run(tokio::time::sleep(Duration::from_millis(2500)), None)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    assert!(closed.load(Ordering::SeqCst));
    let kinds: Vec<DiagnosticKind> = reported.lock().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::Uptime,
            DiagnosticKind::ClientAddress,
            DiagnosticKind::MaxConnections,
            DiagnosticKind::ThreadsConnected,
        ]
    );

    let status = outcome.last.worker(WorkerKind::Status);
    assert_eq!(status.sequence, 5);
    assert_eq!(status.failures, 1);
    assert_eq!(status.connection_id, Some(99));
    assert_eq!(outcome.last.connects(), 2);
    assert!(outcome.summary.worker(WorkerKind::Status).is_none());
}

#[tokio::test(start_paused = true)]
async fn hanging_status_worker_is_aborted_on_shutdown() {
    let mut controller = Controller::new();
    spawn(&mut controller, WorkerKind::Ping, Scripted::new(Duration::from_millis(10)));
    let closed = Arc::new(AtomicBool::new(false));
    controller
        .spawn_status(
            FakeDiagnostics {
                hang_on: Some(DiagnosticKind::MaxConnections),
                closed: closed.clone(),
            },
            None,
        )
        .unwrap_or_else(|e| panic!("spawn status failed: {e}"));

    let outcome = controller
        .run(tokio::time::sleep(Duration::from_millis(1500)), None)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    assert_eq!(outcome.stop_reason, StopReason::Interrupted);
    assert!(!closed.load(Ordering::SeqCst));
    assert_eq!(outcome.last.worker(WorkerKind::Status).sequence, 3);
}
