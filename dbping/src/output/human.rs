use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;

mod format;
mod summary;
mod tick;

use crate::config::{Setting, describe};

use super::{Connected, OutputFormatter};

pub(crate) struct HumanReadableOutput {
    quiet: bool,
}

impl HumanReadableOutput {
    pub(crate) fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_sources(&self, from_env: &[Setting], from_mycnf: &[Setting]) {
        if self.quiet {
            return;
        }
        let mut out = String::new();
        if !from_env.is_empty() {
            writeln!(out, "Using envs: {}", describe(from_env)).ok();
        }
        if !from_mycnf.is_empty() {
            writeln!(out, "Using .my.cnf: {}", describe(from_mycnf)).ok();
        }
        emit(&out);
    }

    fn print_connecting(&self, user: &str, host: &str, port: u16) {
        emit(&format!("Connecting {user}@{host}:{port}...\n"));
    }

    fn print_connected(&self, c: &Connected<'_>) {
        emit(&render_connected(c, self.quiet));
    }

    fn progress(&self) -> Option<dbping_core::ProgressFn> {
        let quiet = self.quiet;
        Some(Arc::new(move |u| emit(&tick::render(&u, quiet))))
    }

    fn diagnostics(&self) -> Option<dbping_core::DiagnosticFn> {
        if self.quiet {
            return None;
        }
        Some(Arc::new(|d| emit(&format!("{}: {}\n", d.kind, d.value))))
    }

    fn print_summary(&self, host: &str, outcome: &dbping_core::RunOutcome) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(summary::render(host, outcome).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

fn render_connected(c: &Connected<'_>, quiet: bool) -> String {
    let mut out = String::new();
    let shown = c.addresses.map(|a| format!(" ({a})")).unwrap_or_default();
    writeln!(out, "Successfully connected to {}{shown}", c.host).ok();

    if let Some(record) = c.addresses.and_then(|a| a.record()) {
        writeln!(out, "Hostname resolves to {}", record.canonical_name).ok();
        writeln!(
            out,
            "DNS record expires in {} seconds",
            record.expires_in.as_secs()
        )
        .ok();
    }
    writeln!(out, "Server version: {}", c.server.version).ok();

    if !quiet {
        let s = c.server;
        writeln!(out, "  port: {}", c.port).ok();
        writeln!(out, "  user: {}", c.user).ok();
        writeln!(out, "  database: {}", c.database.unwrap_or("-")).ok();
        writeln!(out, "  tls cipher: {}", s.tls_cipher.as_deref().unwrap_or("-")).ok();
        writeln!(out, "  tls version: {}", s.tls_version.as_deref().unwrap_or("-")).ok();
        writeln!(out, "  character set: {}", s.character_set).ok();
        writeln!(out, "  collation: {}", s.collation).ok();
        writeln!(out, "  connection id: {}", s.connection_id).ok();
    }
    out
}

/// Writes to stdout, ignoring a closed pipe.
fn emit(text: &str) {
    write_lossy(&mut std::io::stdout().lock(), text);
}

fn write_lossy<W: std::io::Write>(out: &mut W, text: &str) {
    if out.write_all(text.as_bytes()).is_ok() {
        let _ = out.flush();
    }
}
