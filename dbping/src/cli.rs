use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))?;

    match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        )),
    }
}

fn parse_timeout(input: &str) -> Result<Duration, String> {
    let timeout = parse_duration(input)?;
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(timeout)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One status line per second and a summary block.
    HumanReadable,
    /// One JSON object per line (NDJSON) on stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "db-ping",
    author,
    version,
    about = "Continuously test that a MariaDB/MySQL server responds to pings, reads and writes",
    long_about = "db-ping connects to a MariaDB/MySQL server and, once per second on separate connections, pings it, reads from it and writes to it. Each second one status line is printed; on Ctrl-C a summary shows how many of the operations succeeded in time.\n\nConnection parameters are taken from command-line flags, then from the environment variables DB_HOST, DB_PORT, DB_USER, DB_PASSWORD and DB_NAME, then from the [client] section of ./.my.cnf and ~/.my.cnf.\n\nWrites go to the table `db-ping` in the given database, or in `tmp` or `test` when no database is given.",
    after_help = "Examples:\n  db-ping --host db.example.com\n  DB_HOST=10.0.0.5 DB_USER=monitor db-ping --quiet\n  db-ping --host db.example.com --ca-cert ./ca.pem --output json"
)]
pub struct Cli {
    /// Database server hostname or IP address
    #[arg(long)]
    pub host: Option<String>,

    /// Database server port [default: 3306]
    #[arg(long)]
    pub port: Option<u16>,

    /// Database username [default: db-ping]
    #[arg(long)]
    pub user: Option<String>,

    /// Database user password
    #[arg(long)]
    pub password: Option<String>,

    /// Database for the write test table (defaults to `tmp` or `test`)
    #[arg(long)]
    pub database: Option<String>,

    /// Don't verify the server's TLS certificate
    #[arg(long, conflicts_with = "ca_cert")]
    pub insecure: bool,

    /// Path to a custom CA PEM file, needed for self-signed server certificates
    #[arg(long, value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Print less: no connection details, no status diagnostics, no connects counter
    #[arg(long, short)]
    pub quiet: bool,

    /// Connect and per-operation timeout (e.g. 10s, 250ms, 1m)
    #[arg(long, value_parser = parse_timeout, default_value = "10s")]
    pub timeout: Duration,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
