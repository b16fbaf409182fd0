mod error;
mod kind;
mod probe;
mod scratch;
mod session;
mod status;
mod tls;
mod types;

pub use error::{Error, Result};
pub use kind::MysqlErrorKind;
pub use probe::{PingProbe, ReadProbe, WriteProbe};
pub use scratch::{SCRATCH_TABLE, ScratchTable};
pub use session::{ServerInfo, Session};
pub use status::MysqlDiagnostics;
pub use types::{ConnectOptions, TlsConfig};
