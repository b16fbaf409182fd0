use std::path::PathBuf;
use std::time::Duration;

use super::MysqlErrorKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Mysql(#[from] mysql_async::Error),

    #[error("operation timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("could not connect within {}", humantime::format_duration(*.0))]
    ConnectTimeout(Duration),

    #[error("CA certificate not found: {}", .0.display())]
    CaCertNotFound(PathBuf),

    #[error("--insecure and --ca-cert cannot be used together")]
    ConflictingTls,

    #[error("read back {found} from the scratch table, expected {expected}")]
    Verification { expected: i64, found: i64 },

    #[error("no database given and neither `tmp` nor `test` exists")]
    NoScratchDatabase,

    #[error("query returned no rows: {0}")]
    MissingValue(&'static str),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> MysqlErrorKind {
        match self {
            Self::Mysql(mysql_async::Error::Server(_)) => MysqlErrorKind::Server,
            Self::Mysql(mysql_async::Error::Io(_)) => MysqlErrorKind::Io,
            Self::Mysql(mysql_async::Error::Driver(_)) => MysqlErrorKind::Driver,
            Self::Mysql(_) => MysqlErrorKind::Other,
            Self::Timeout(_) | Self::ConnectTimeout(_) => MysqlErrorKind::Timeout,
            Self::CaCertNotFound(_) | Self::ConflictingTls => MysqlErrorKind::Tls,
            Self::Verification { .. } => MysqlErrorKind::Verification,
            Self::NoScratchDatabase | Self::MissingValue(_) => MysqlErrorKind::Schema,
        }
    }
}
