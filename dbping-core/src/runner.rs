mod counters;
mod error;
mod progress;
mod run;
mod signal;
mod status;
mod summary;
mod worker;

use std::time::Duration;

/// Controller tick period and the cadence every continuous worker paces itself to.
pub const TICK: Duration = Duration::from_secs(1);

pub use counters::{Counters, CountersSnapshot, StatsSlot, WorkerKind, WorkerStats};
pub use error::{Error, Result};
pub use progress::{ProgressFn, ProgressUpdate};
pub use run::{Controller, RunOutcome, StopReason};
pub use signal::RunFlag;
pub use status::{Diagnostic, DiagnosticFn, DiagnosticKind, Diagnostics};
pub use summary::{RunSummary, WorkerSummary};
pub use worker::{Observation, Probe};
