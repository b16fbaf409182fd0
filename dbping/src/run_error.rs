use dbping_mysql::MysqlErrorKind;

use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    ConnectFailed(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::ConnectFailed(_) => ExitCode::ConnectFailed,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::ConnectFailed(e) | Self::RuntimeError(e) => e,
        }
    }

    /// Startup failures: TLS setup problems are the operator's input, everything else
    /// means the server could not be reached.
    pub fn startup(context: &'static str, err: dbping_mysql::Error) -> Self {
        let kind = err.kind();
        tracing::debug!(%kind, "{context} failed: {err}");
        let wrap = match kind {
            MysqlErrorKind::Tls => Self::InvalidInput,
            _ => Self::ConnectFailed,
        };
        wrap(anyhow::Error::new(err).context(context))
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(e) | Self::ConnectFailed(e) | Self::RuntimeError(e) => {
                write!(f, "{e:#}")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
