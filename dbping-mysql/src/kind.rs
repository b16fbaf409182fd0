/// Coarse classification of a failed database call. Picks the exit status of a failed
/// startup and is logged alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MysqlErrorKind {
    Server,
    Io,
    Driver,
    Timeout,
    Tls,
    Verification,
    Schema,
    Other,
}
