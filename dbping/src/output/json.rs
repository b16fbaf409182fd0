use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use dbping_core::{RunOutcome, StopReason, WorkerKind};

use crate::config::Setting;

use super::{Connected, OutputFormatter};

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_sources(&self, from_env: &[Setting], from_mycnf: &[Setting]) {
        if from_env.is_empty() && from_mycnf.is_empty() {
            return;
        }
        emit_json_line(&JsonSourcesLine {
            kind: "config",
            from_env: from_env.iter().map(ToString::to_string).collect(),
            from_mycnf: from_mycnf.iter().map(ToString::to_string).collect(),
        });
    }

    fn print_connecting(&self, _user: &str, _host: &str, _port: u16) {}

    fn print_connected(&self, connected: &Connected<'_>) {
        emit_json_line(&build_connected_line(connected));
    }

    fn progress(&self) -> Option<dbping_core::ProgressFn> {
        Some(Arc::new(|u| emit_json_line(&build_tick_line(&u))))
    }

    fn diagnostics(&self) -> Option<dbping_core::DiagnosticFn> {
        Some(Arc::new(|d| {
            emit_json_line(&JsonDiagnosticLine {
                kind: "diagnostic",
                name: d.kind.to_string(),
                value: d.value,
            });
        }))
    }

    fn print_summary(&self, host: &str, outcome: &RunOutcome) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        serde_json::to_writer(&mut out, &build_summary_line(host, outcome))?;
        writeln!(out)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSourcesLine {
    pub kind: &'static str,
    pub from_env: Vec<String>,
    pub from_mycnf: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonConnectedLine {
    pub kind: &'static str,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: Option<String>,
    pub server_version: String,
    pub connection_id: u32,
    pub character_set: String,
    pub collation: String,
    pub tls_cipher: Option<String>,
    pub tls_version: Option<String>,
    pub addresses: Vec<String>,
    pub reverse_name: Option<String>,
    pub canonical_name: Option<String>,
    pub dns_expires_in_secs: Option<u64>,
}

fn build_connected_line(c: &Connected<'_>) -> JsonConnectedLine {
    let record = c.addresses.and_then(|a| a.record());
    JsonConnectedLine {
        kind: "connected",
        host: c.host.to_string(),
        port: c.port,
        user: c.user.to_string(),
        database: c.database.map(str::to_string),
        server_version: c.server.version.clone(),
        connection_id: c.server.connection_id,
        character_set: c.server.character_set.clone(),
        collation: c.server.collation.clone(),
        tls_cipher: c.server.tls_cipher.clone(),
        tls_version: c.server.tls_version.clone(),
        addresses: c
            .addresses
            .map(|a| a.addresses().iter().map(ToString::to_string).collect())
            .unwrap_or_default(),
        reverse_name: c.addresses.and_then(|a| a.reverse_name()).map(str::to_string),
        canonical_name: record.map(|r| r.canonical_name.clone()),
        dns_expires_in_secs: record.map(|r| r.expires_in.as_secs()),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonDiagnosticLine {
    pub kind: &'static str,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonTickLine {
    pub kind: &'static str,
    pub tick: u64,
    pub elapsed_secs: f64,
    pub ping_latency_secs: f64,
    pub ping_stalled: bool,
    pub connects: u64,
    pub reconnected: Vec<String>,
    pub workers: Vec<JsonWorkerTick>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonWorkerTick {
    pub worker: String,
    pub sequence: u64,
    pub failures: u64,
    pub reconnects: u64,
    pub last_latency_secs: f64,
    pub connection_id: Option<u64>,
    pub extra: Option<i64>,
}

fn build_tick_line(u: &dbping_core::ProgressUpdate) -> JsonTickLine {
    let workers = WorkerKind::CONTINUOUS
        .into_iter()
        .map(|kind| {
            let s = u.snapshot.worker(kind);
            JsonWorkerTick {
                worker: kind.to_string(),
                sequence: s.sequence,
                failures: s.failures,
                reconnects: s.reconnect_count,
                last_latency_secs: s.last_latency.as_secs_f64(),
                connection_id: s.connection_id,
                extra: s.extra,
            }
        })
        .collect();

    JsonTickLine {
        kind: "tick",
        tick: u.tick,
        elapsed_secs: u.elapsed.as_secs_f64(),
        ping_latency_secs: u.ping_latency.as_secs_f64(),
        ping_stalled: u.ping_stalled,
        connects: u.connects,
        reconnected: u.reconnected.iter().map(ToString::to_string).collect(),
        workers,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub host: String,
    pub stop_reason: &'static str,
    pub exited_worker: Option<String>,
    pub elapsed_secs: f64,
    pub ticks: u64,
    pub availability_pct: Option<f64>,
    pub workers: Vec<JsonWorkerSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonWorkerSummary {
    pub worker: String,
    pub sequence: u64,
    pub sla_pct: Option<f64>,
    pub failures: u64,
    pub reconnects: u64,
    pub latency_min_secs: Option<f64>,
    pub latency_avg_secs: Option<f64>,
    pub latency_max_secs: Option<f64>,
}

fn build_summary_line(host: &str, outcome: &RunOutcome) -> JsonSummaryLine {
    let (stop_reason, exited_worker) = match outcome.stop_reason {
        StopReason::Interrupted => ("interrupted", None),
        StopReason::WorkerExited(kind) => ("worker_exited", Some(kind.to_string())),
    };

    let summary = &outcome.summary;
    let workers = summary
        .workers
        .iter()
        .map(|w| JsonWorkerSummary {
            worker: w.kind.to_string(),
            sequence: w.sequence,
            sla_pct: w.sla_pct,
            failures: w.failures,
            reconnects: w.reconnects,
            latency_min_secs: w.latency_min.map(|d| d.as_secs_f64()),
            latency_avg_secs: w.latency_avg.map(|d| d.as_secs_f64()),
            latency_max_secs: w.latency_max.map(|d| d.as_secs_f64()),
        })
        .collect();

    JsonSummaryLine {
        kind: "summary",
        host: host.to_string(),
        stop_reason,
        exited_worker,
        elapsed_secs: summary.elapsed.as_secs_f64(),
        ticks: summary.ticks,
        availability_pct: summary.availability_pct(),
        workers,
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
