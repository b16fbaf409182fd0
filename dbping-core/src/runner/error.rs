use super::counters::WorkerKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a `{0}` worker is already running")]
    DuplicateWorker(WorkerKind),

    #[error("`{0}` is not a continuous worker")]
    NotContinuous(WorkerKind),

    #[error("no continuous workers were started")]
    NoWorkers,
}
