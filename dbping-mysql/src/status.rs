use std::time::Duration;

use dbping_core::{DiagnosticKind, Diagnostics};
use mysql_async::Conn;
use mysql_async::prelude::*;

use super::{Error, Result, Session};

/// Server facts for the one-shot status worker, all read over one session.
#[derive(Debug)]
pub struct MysqlDiagnostics {
    session: Session,
    connection_id: Option<u64>,
}

impl MysqlDiagnostics {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            connection_id: None,
        }
    }
}

impl Diagnostics for MysqlDiagnostics {
    type Error = Error;

    async fn query(&mut self, kind: DiagnosticKind) -> Result<String> {
        let session = &self.session;
        let (id, value) = session
            .bounded(async {
                let mut conn = session.conn().await?;
                let value = match kind {
                    DiagnosticKind::Uptime => {
                        let secs = show_value(&mut conn, "SHOW GLOBAL STATUS LIKE 'Uptime'").await?;
                        Ok(format_uptime(&secs))
                    }
                    DiagnosticKind::ClientAddress => {
                        let id = conn.id();
                        let host: Option<String> = conn
                            .exec_first(
                                "SELECT host FROM information_schema.processlist WHERE id = ?",
                                (id,),
                            )
                            .await?;
                        host.ok_or(Error::MissingValue("processlist host"))
                    }
                    DiagnosticKind::ServerHostname => {
                        show_value(&mut conn, "SHOW VARIABLES LIKE 'hostname'").await
                    }
                    DiagnosticKind::MaxConnections => {
                        show_value(&mut conn, "SHOW VARIABLES LIKE 'max_connections'").await
                    }
                    DiagnosticKind::ThreadsConnected => {
                        show_value(&mut conn, "SHOW GLOBAL STATUS LIKE 'Threads_connected'").await
                    }
                }?;
                Ok((u64::from(conn.id()), value))
            })
            .await?;

        self.connection_id = Some(id);
        Ok(value)
    }

    fn connection_id(&self) -> Option<u64> {
        self.connection_id
    }

    async fn close(self) {
        self.session.close().await;
    }
}

/// Value column of a `SHOW STATUS` / `SHOW VARIABLES` row.
async fn show_value(conn: &mut Conn, query: &'static str) -> Result<String> {
    let row: Option<(String, String)> = conn.query_first(query).await?;
    row.map(|(_, value)| value).ok_or(Error::MissingValue(query))
}

/// Renders `Uptime` seconds as a human duration; anything unparsable is shown as is.
fn format_uptime(secs: &str) -> String {
    match secs.trim().parse::<u64>() {
        Ok(secs) => humantime::format_duration(Duration::from_secs(secs)).to_string(),
        Err(_) => secs.to_string(),
    }
}
