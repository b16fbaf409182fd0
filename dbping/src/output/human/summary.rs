use std::fmt::Write as _;

use dbping_core::{RunOutcome, StopReason};

use super::format::{format_elapsed, format_latency_triplet, format_sla};

pub(crate) fn render(host: &str, outcome: &RunOutcome) -> String {
    let mut out = String::new();
    let summary = &outcome.summary;

    match outcome.stop_reason {
        StopReason::Interrupted => out.push_str("Interrupted, aborting...\n"),
        StopReason::WorkerExited(kind) => {
            writeln!(out, "Error: {kind} worker died, aborting...").ok();
        }
    }

    writeln!(out, "--- {host} db-ping statistics ---").ok();
    writeln!(
        out,
        "wall clock duration: {} seconds",
        format_elapsed(summary.elapsed)
    )
    .ok();
    writeln!(
        out,
        "ticks: {}, operations succeeded: {}",
        summary.ticks,
        format_sla(summary.availability_pct())
    )
    .ok();

    for w in &summary.workers {
        writeln!(
            out,
            "{}: {}/{} (SLA {}) latency min/avg/max {}, failures {}, reconnects {}",
            w.kind,
            w.sequence,
            summary.ticks,
            format_sla(w.sla_pct),
            format_latency_triplet(w.latency_min, w.latency_avg, w.latency_max),
            w.failures,
            w.reconnects
        )
        .ok();
    }

    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dbping_core::{CountersSnapshot, RunSummary, WorkerKind};

    use super::*;

    fn outcome(stop_reason: StopReason, ticks: u64) -> RunOutcome {
        let last = CountersSnapshot::at_tick(ticks);
        RunOutcome {
            stop_reason,
            summary: RunSummary::from_snapshot(&last, Duration::from_millis(3400)),
            last,
        }
    }

    #[test]
    fn renders_header_and_every_worker() {
        let out = render("db1.example.com", &outcome(StopReason::Interrupted, 3));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Interrupted, aborting...");
        assert_eq!(lines[1], "--- db1.example.com db-ping statistics ---");
        assert_eq!(lines[2], "wall clock duration: 3 seconds");
        assert_eq!(lines[3], "ticks: 3, operations succeeded: n/a");
        assert_eq!(
            lines[4],
            "ping: 0/3 (SLA 0.00%) latency min/avg/max -/-/- s, failures 0, reconnects 0"
        );
        assert!(lines[5].starts_with("read: 0/3"));
        assert!(lines[6].starts_with("write: 0/3"));
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn zero_ticks_has_no_sla() {
        let out = render("db1", &outcome(StopReason::Interrupted, 0));
        assert!(out.contains("ping: 0/0 (SLA n/a)"));
    }

    #[test]
    fn dead_worker_is_named() {
        let out = render(
            "db1",
            &outcome(StopReason::WorkerExited(WorkerKind::Read), 2),
        );
        assert!(out.starts_with("Error: read worker died, aborting...\n"));
    }
}
