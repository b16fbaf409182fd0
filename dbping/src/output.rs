use dbping_core::{DiagnosticFn, ProgressFn, RunOutcome};
use dbping_mysql::ServerInfo;

use crate::cli::OutputFormat;
use crate::config::Setting;
use crate::resolve::HostAddrs;

mod human;
mod json;

/// Facts about the first successful connection.
#[derive(Debug, Clone)]
pub(crate) struct Connected<'a> {
    pub host: &'a str,
    pub port: u16,
    pub user: &'a str,
    pub database: Option<&'a str>,
    pub server: &'a ServerInfo,
    pub addresses: Option<&'a HostAddrs>,
}

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_sources(&self, from_env: &[Setting], from_mycnf: &[Setting]);
    fn print_connecting(&self, user: &str, host: &str, port: u16);
    fn print_connected(&self, connected: &Connected<'_>);
    fn progress(&self) -> Option<ProgressFn>;
    fn diagnostics(&self) -> Option<DiagnosticFn>;
    fn print_summary(&self, host: &str, outcome: &RunOutcome) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat, quiet: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new(quiet)),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
