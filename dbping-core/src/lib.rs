pub mod runner;

pub use runner::{
    Controller, Counters, CountersSnapshot, Diagnostic, DiagnosticFn, DiagnosticKind, Diagnostics,
    Error, Observation, Probe, ProgressFn, ProgressUpdate, Result, RunFlag, RunOutcome,
    RunSummary, StopReason, TICK, WorkerKind, WorkerStats, WorkerSummary,
};
