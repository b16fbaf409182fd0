use dbping_core::StopReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Stopped by the operator.
    Success = 0,

    /// A continuous worker died; the summary was still printed.
    WorkerDied = 10,

    /// The first connection to the server could not be established.
    ConnectFailed = 20,

    /// Invalid CLI/config input (bad flags, missing host, unreadable CA file, etc.).
    InvalidInput = 30,

    /// Internal/runtime error.
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_stop_reason(reason: StopReason) -> Self {
        match reason {
            StopReason::Interrupted => Self::Success,
            StopReason::WorkerExited(_) => Self::WorkerDied,
        }
    }
}
