use std::fmt::Write as _;

use super::format::{format_elapsed, format_secs};

/// One tick: an optional reconnect notice, then the status line.
pub(crate) fn render(u: &dbping_core::ProgressUpdate, quiet: bool) -> String {
    let mut out = String::new();

    if !u.reconnected.is_empty() {
        let kinds = u
            .reconnected
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "database client reconnected ({kinds})").ok();
    }

    write!(
        out,
        "{}s #{} ping={}s",
        format_elapsed(u.elapsed),
        u.tick,
        format_secs(u.ping_latency)
    )
    .ok();
    if !quiet {
        write!(out, " connects={}", u.connects).ok();
    }
    out.push('\n');
    out
}
