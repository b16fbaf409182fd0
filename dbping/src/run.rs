use anyhow::Context as _;

use dbping_core::{Controller, WorkerKind};
use dbping_mysql::{MysqlDiagnostics, PingProbe, ReadProbe, Session, WriteProbe};

use crate::cli::Cli;
use crate::config::{self, MyCnf};
use crate::exit_codes::ExitCode;
use crate::output::{self, Connected};
use crate::resolve;
use crate::run_error::RunError;

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let out = output::formatter(cli.output, cli.quiet);

    let mycnf = MyCnf::load_default();
    let resolved = config::resolve(&cli, |name| std::env::var(name).ok(), &mycnf)
        .map_err(RunError::InvalidInput)?;
    out.print_sources(&resolved.from_env, &resolved.from_mycnf);

    let opts = resolved.connect;
    out.print_connecting(&opts.user, &opts.host, opts.port);

    let status_session = Session::open(&opts)
        .await
        .map_err(|e| RunError::startup("failed to connect", e))?;
    let server = status_session
        .server_info()
        .await
        .map_err(|e| RunError::startup("failed to query server version", e))?;

    let addresses = match resolve::lookup(&opts.host, opts.port).await {
        Ok(addrs) => Some(addrs),
        Err(err) => {
            tracing::warn!(host = %opts.host, "address lookup failed: {err}");
            None
        }
    };

    out.print_connected(&Connected {
        host: &opts.host,
        port: opts.port,
        user: &opts.user,
        database: opts.database.as_deref(),
        server: &server,
        addresses: addresses.as_ref(),
    });

    let ping = Session::open(&opts)
        .await
        .map_err(|e| RunError::startup("failed to open ping session", e))?;
    let read = Session::open(&opts)
        .await
        .map_err(|e| RunError::startup("failed to open read session", e))?;
    let write = Session::open(&opts)
        .await
        .map_err(|e| RunError::startup("failed to open write session", e))?;
    let write = WriteProbe::prepare(write, opts.database.as_deref())
        .await
        .map_err(|e| RunError::startup("failed to prepare write probe", e))?;

    let mut controller = Controller::new();
    spawn_workers(&mut controller, ping, read, write, status_session, out.as_ref())
        .map_err(|e| RunError::RuntimeError(e.into()))?;

    let outcome = controller
        .run(shutdown_signal(), out.progress())
        .await
        .context("controller failed")
        .map_err(RunError::RuntimeError)?;

    out.print_summary(&opts.host, &outcome)
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::from_stop_reason(outcome.stop_reason))
}

fn spawn_workers(
    controller: &mut Controller,
    ping: Session,
    read: Session,
    write: WriteProbe,
    status: Session,
    out: &dyn output::OutputFormatter,
) -> dbping_core::Result<()> {
    controller.spawn_worker(WorkerKind::Ping, PingProbe::new(ping))?;
    controller.spawn_worker(WorkerKind::Read, ReadProbe::new(read))?;
    controller.spawn_worker(WorkerKind::Write, write)?;
    controller.spawn_status(MysqlDiagnostics::new(status), out.diagnostics())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    () = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!("failed to listen for SIGTERM: {err}");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
