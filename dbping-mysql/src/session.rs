use std::future::Future;
use std::time::Duration;

use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};

use super::tls::ssl_opts;
use super::{ConnectOptions, Error, Result};

/// What the server reported about itself on the first connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: String,
    pub connection_id: u32,
    pub character_set: String,
    pub collation: String,
    /// Negotiated TLS parameters; `None` when the server reports none.
    pub tls_cipher: Option<String>,
    pub tls_version: Option<String>,
}

/// One dedicated database session, backed by a pool of exactly one connection.
///
/// A broken connection is replaced on the next checkout; the server-assigned connection id
/// tells the caller whether that happened.
#[derive(Debug, Clone)]
pub struct Session {
    pool: Pool,
    timeout: Duration,
}

impl Session {
    /// Opens the session and verifies that a connection can be established.
    pub async fn open(opts: &ConnectOptions) -> Result<Self> {
        let pool = Pool::new(mysql_opts(opts)?);
        let session = Self {
            pool,
            timeout: opts.timeout,
        };

        let conn = match tokio::time::timeout(opts.timeout, session.pool.get_conn()).await {
            Ok(conn) => conn?,
            Err(_) => {
                session.close().await;
                return Err(Error::ConnectTimeout(opts.timeout));
            }
        };
        tracing::debug!(
            host = %opts.host,
            port = opts.port,
            connection_id = conn.id(),
            "session opened"
        );
        drop(conn);

        Ok(session)
    }

    /// Checks out the connection, reconnecting if needed.
    pub async fn conn(&self) -> Result<Conn> {
        Ok(self.pool.get_conn().await?)
    }

    /// Runs one database call under the session's timeout.
    pub async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }

    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.bounded(async {
            let mut conn = self.conn().await?;
            let row: Option<(String, String, String)> = conn
                .query_first(
                    "SELECT VERSION(), @@character_set_connection, @@collation_connection",
                )
                .await?;
            let (version, character_set, collation) =
                row.ok_or(Error::MissingValue("SELECT VERSION()"))?;

            let status: Vec<(String, String)> = conn
                .query(
                    "SHOW SESSION STATUS WHERE Variable_name IN ('Ssl_cipher', 'Ssl_version')",
                )
                .await?;
            let (tls_cipher, tls_version) = tls_from_status(status);

            Ok(ServerInfo {
                version,
                connection_id: conn.id(),
                character_set,
                collation,
                tls_cipher,
                tls_version,
            })
        })
        .await
    }

    pub async fn close(self) {
        if let Err(err) = self.pool.disconnect().await {
            tracing::debug!("error while closing session: {err}");
        }
    }
}

/// Picks `Ssl_cipher` and `Ssl_version` out of session status rows. Empty means unset.
fn tls_from_status(rows: Vec<(String, String)>) -> (Option<String>, Option<String>) {
    let mut cipher = None;
    let mut version = None;
    for (name, value) in rows {
        let value = Some(value).filter(|v| !v.is_empty());
        if name.eq_ignore_ascii_case("Ssl_cipher") {
            cipher = value;
        } else if name.eq_ignore_ascii_case("Ssl_version") {
            version = value;
        }
    }
    (cipher, version)
}

fn mysql_opts(opts: &ConnectOptions) -> Result<Opts> {
    let constraints = PoolConstraints::new(1, 1).unwrap_or_default();
    let pool_opts = PoolOpts::default()
        .with_constraints(constraints)
        .with_reset_connection(false);

    let builder = OptsBuilder::default()
        .ip_or_hostname(opts.host.as_str())
        .tcp_port(opts.port)
        .user(Some(opts.user.as_str()))
        .pass(Some(opts.password.as_str()))
        .db_name(opts.database.as_deref())
        .prefer_socket(false)
        .ssl_opts(ssl_opts(&opts.tls)?)
        .pool_opts(pool_opts);

    Ok(builder.into())
}
