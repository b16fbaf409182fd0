use dbping_core::{Observation, Probe};
use mysql_async::prelude::*;

use super::{Error, Result, ScratchTable, Session};

/// `COM_PING` on the worker's own connection.
#[derive(Debug)]
pub struct PingProbe {
    session: Session,
}

impl PingProbe {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl Probe for PingProbe {
    type Error = Error;

    async fn execute(&mut self) -> Result<Observation> {
        let session = &self.session;
        session
            .bounded(async {
                let mut conn = session.conn().await?;
                conn.ping().await?;
                Ok(Observation::new(u64::from(conn.id())))
            })
            .await
    }

    async fn close(self) {
        self.session.close().await;
    }
}

/// Counts the server's process list. The count is reported as the worker's extra value.
#[derive(Debug)]
pub struct ReadProbe {
    session: Session,
}

impl ReadProbe {
    const QUERY: &'static str = "SELECT COUNT(*) FROM information_schema.processlist";

    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl Probe for ReadProbe {
    type Error = Error;

    async fn execute(&mut self) -> Result<Observation> {
        let session = &self.session;
        session
            .bounded(async {
                let mut conn = session.conn().await?;
                let count: Option<i64> = conn.query_first(Self::QUERY).await?;
                let count = count.ok_or(Error::MissingValue(Self::QUERY))?;
                Ok(Observation::new(u64::from(conn.id())).with_extra(count))
            })
            .await
    }

    async fn close(self) {
        self.session.close().await;
    }
}

/// Round-trips one row through the scratch table and checks the value read back.
#[derive(Debug)]
pub struct WriteProbe {
    session: Session,
    scratch: ScratchTable,
    cycles: i64,
}

impl WriteProbe {
    /// Resolves and creates the scratch table. The row is keyed by this process id so
    /// concurrent instances against the same server do not collide.
    pub async fn prepare(session: Session, database: Option<&str>) -> Result<Self> {
        let key = u64::from(std::process::id());
        let scratch = session
            .bounded(async {
                let mut conn = session.conn().await?;
                ScratchTable::prepare(&mut conn, database, key).await
            })
            .await?;
        tracing::debug!(table = scratch.table(), key, "scratch table ready");

        Ok(Self {
            session,
            scratch,
            cycles: 0,
        })
    }
}

impl Probe for WriteProbe {
    type Error = Error;

    async fn execute(&mut self) -> Result<Observation> {
        self.cycles = self.cycles.wrapping_add(1);
        let value = self.cycles;
        let (session, scratch) = (&self.session, &self.scratch);
        session
            .bounded(async {
                let mut conn = session.conn().await?;
                let found = scratch.cycle(&mut conn, value).await?;
                Ok(Observation::new(u64::from(conn.id())).with_extra(found))
            })
            .await
    }

    async fn close(self) {
        let cleanup = self
            .session
            .bounded(async {
                let mut conn = self.session.conn().await?;
                self.scratch.cleanup(&mut conn).await;
                Ok(())
            })
            .await;
        if let Err(err) = cleanup {
            tracing::debug!("scratch row cleanup skipped: {err}");
        }
        self.session.close().await;
    }
}
