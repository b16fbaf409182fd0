use std::path::Path;
use std::process::{Command, Output};

use anyhow::Context as _;

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Runs the binary with no option files and no DB_* variables in reach.
fn db_ping(home: &Path, args: &[&str]) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_db-ping");

    Command::new(exe)
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env_remove("DB_HOST")
        .env_remove("DB_PORT")
        .env_remove("DB_USER")
        .env_remove("DB_PASSWORD")
        .env_remove("DB_NAME")
        .env_remove("RUST_LOG")
        .output()
        .context("run db-ping binary")
}

fn expect_code(out: &Output, code: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == code,
        "expected exit code {code}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

#[test]
fn invalid_flags_exit_30() -> anyhow::Result<()> {
    let home = tempfile::tempdir().context("tempdir")?;
    let out = db_ping(home.path(), &["--host", "db1", "--timeout", "10x"])?;
    expect_code(&out, 30)
}

#[test]
fn missing_host_exit_30() -> anyhow::Result<()> {
    let home = tempfile::tempdir().context("tempdir")?;
    let out = db_ping(home.path(), &[])?;
    expect_code(&out, 30)?;

    let stderr = String::from_utf8_lossy(&out.stderr);
    anyhow::ensure!(
        stderr.contains("no host defined"),
        "unexpected stderr:\n{stderr}"
    );
    Ok(())
}

#[test]
fn conflicting_tls_flags_exit_30() -> anyhow::Result<()> {
    let home = tempfile::tempdir().context("tempdir")?;
    let out = db_ping(
        home.path(),
        &["--host", "db1", "--insecure", "--ca-cert", "ca.pem"],
    )?;
    expect_code(&out, 30)
}

#[test]
fn missing_ca_file_exit_30() -> anyhow::Result<()> {
    let home = tempfile::tempdir().context("tempdir")?;
    let out = db_ping(
        home.path(),
        &["--host", "127.0.0.1", "--ca-cert", "does-not-exist.pem"],
    )?;
    expect_code(&out, 30)
}

#[test]
fn unreachable_server_exit_20() -> anyhow::Result<()> {
    let home = tempfile::tempdir().context("tempdir")?;
    let out = db_ping(
        home.path(),
        &["--host", "127.0.0.1", "--port", "1", "--timeout", "2s"],
    )?;
    expect_code(&out, 20)?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(
        stdout.contains("Connecting db-ping@127.0.0.1:1..."),
        "unexpected stdout:\n{stdout}"
    );
    anyhow::ensure!(
        !stdout.contains("statistics"),
        "summary printed without a run:\n{stdout}"
    );
    Ok(())
}

#[test]
fn host_from_mycnf_is_used() -> anyhow::Result<()> {
    let home = tempfile::tempdir().context("tempdir")?;
    std::fs::write(
        home.path().join(".my.cnf"),
        "[client]\nhost=127.0.0.1\nport=1\n",
    )
    .context("write .my.cnf")?;

    let out = db_ping(home.path(), &["--timeout", "2s"])?;
    expect_code(&out, 20)?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    anyhow::ensure!(
        stdout.contains("Using .my.cnf: host, port"),
        "unexpected stdout:\n{stdout}"
    );
    Ok(())
}
