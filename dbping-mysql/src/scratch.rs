use mysql_async::Conn;
use mysql_async::prelude::*;

use super::{Error, Result};

pub const SCRATCH_TABLE: &str = "db-ping";

/// Databases tried, in order, when no database was configured.
const FALLBACK_DATABASES: [&str; 2] = ["tmp", "test"];

/// The write cycle's table and the row this process owns in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchTable {
    /// Fully quoted table reference, optionally schema-qualified.
    table: String,
    key: u64,
}

impl ScratchTable {
    #[must_use]
    pub fn new(schema: Option<&str>, key: u64) -> Self {
        let name = quote_ident(SCRATCH_TABLE);
        let table = match schema {
            Some(schema) => format!("{}.{name}", quote_ident(schema)),
            None => name,
        };
        Self { table, key }
    }

    /// Picks the table's location and creates it if missing.
    ///
    /// With a configured database the table lives there; otherwise the first existing
    /// database out of `tmp` and `test` is used.
    pub async fn prepare(conn: &mut Conn, database: Option<&str>, key: u64) -> Result<Self> {
        let scratch = match database {
            Some(_) => Self::new(None, key),
            None => {
                let schema = fallback_schema(conn).await?;
                tracing::debug!(schema = %schema, "no database configured, using fallback");
                Self::new(Some(&schema), key)
            }
        };

        conn.query_drop(scratch.create_sql()).await?;
        Ok(scratch)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    /// One write cycle: DELETE, INSERT `value`, UPDATE to `value + 1`, SELECT it back.
    ///
    /// Returns the value read back, which must equal the value written.
    pub async fn cycle(&self, conn: &mut Conn, value: i64) -> Result<i64> {
        let key = self.key;
        conn.exec_drop(self.delete_sql(), (key,)).await?;
        conn.exec_drop(self.insert_sql(), (key, value)).await?;
        conn.exec_drop(self.update_sql(), (key,)).await?;

        let found: Option<i64> = conn.exec_first(self.select_sql(), (key,)).await?;
        let found = found.ok_or(Error::MissingValue("scratch row"))?;

        let expected = value.saturating_add(1);
        if found != expected {
            return Err(Error::Verification { expected, found });
        }
        Ok(found)
    }

    /// Removes this process' row. Failures are ignored; the row is rewritten on the next run.
    pub async fn cleanup(&self, conn: &mut Conn) {
        if let Err(err) = conn.exec_drop(self.delete_sql(), (self.key,)).await {
            tracing::debug!("scratch row cleanup failed: {err}");
        }
    }

    fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id BIGINT UNSIGNED NOT NULL PRIMARY KEY, \
             value BIGINT NOT NULL, \
             updated_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) \
             ON UPDATE CURRENT_TIMESTAMP(6))",
            self.table
        )
    }

    fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = ?", self.table)
    }

    fn insert_sql(&self) -> String {
        format!("INSERT INTO {} (id, value) VALUES (?, ?)", self.table)
    }

    fn update_sql(&self) -> String {
        format!("UPDATE {} SET value = value + 1 WHERE id = ?", self.table)
    }

    fn select_sql(&self) -> String {
        format!("SELECT value FROM {} WHERE id = ?", self.table)
    }
}

async fn fallback_schema(conn: &mut Conn) -> Result<String> {
    let existing: Vec<String> = conn
        .exec(
            "SELECT SCHEMA_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME IN (?, ?)",
            (FALLBACK_DATABASES[0], FALLBACK_DATABASES[1]),
        )
        .await?;
    pick_fallback(&existing)
        .map(str::to_string)
        .ok_or(Error::NoScratchDatabase)
}

fn pick_fallback(existing: &[String]) -> Option<&'static str> {
    FALLBACK_DATABASES
        .into_iter()
        .find(|candidate| existing.iter().any(|name| name == candidate))
}

/// Backtick-quotes an identifier, doubling embedded backticks.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}
