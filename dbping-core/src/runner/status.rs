use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;

use super::counters::StatsSlot;

/// Server facts gathered once by the status worker, in the order they are queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum DiagnosticKind {
    #[strum(serialize = "Uptime")]
    Uptime,
    #[strum(serialize = "Client connection")]
    ClientAddress,
    #[strum(serialize = "Server hostname")]
    ServerHostname,
    #[strum(serialize = "Max connections")]
    MaxConnections,
    #[strum(serialize = "Connections open at server")]
    ThreadsConnected,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 5] = [
        Self::Uptime,
        Self::ClientAddress,
        Self::ServerHostname,
        Self::MaxConnections,
        Self::ThreadsConnected,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub value: String,
}

pub type DiagnosticFn = Arc<dyn Fn(Diagnostic) + Send + Sync + 'static>;

/// Source of the one-shot status diagnostics.
pub trait Diagnostics: Send + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn query(
        &mut self,
        kind: DiagnosticKind,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Identity of the session the last successful query ran on.
    fn connection_id(&self) -> Option<u64>;

    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// Runs every diagnostic once. A failing query is logged and does not stop the rest.
pub(crate) async fn run_status<D: Diagnostics>(
    mut diagnostics: D,
    slot: StatsSlot,
    report: Option<DiagnosticFn>,
) {
    for kind in DiagnosticKind::ALL {
        let started = Instant::now();
        let result = diagnostics.query(kind).await;
        let elapsed = started.elapsed();
        let identity = result.as_ref().ok().and(diagnostics.connection_id());
        slot.update(|stats| {
            if let Some(id) = identity {
                stats.observe_connection(id);
            }
            stats.complete_cycle(elapsed, result.is_err());
        });

        match result {
            Ok(value) => {
                if let Some(report) = &report {
                    (report)(Diagnostic { kind, value });
                }
            }
            Err(err) => tracing::warn!(diagnostic = ?kind, "{kind}: error: {err}"),
        }
    }

    diagnostics.close().await;
    tracing::debug!("status worker finished");
}
