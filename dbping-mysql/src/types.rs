use std::path::PathBuf;
use std::time::Duration;

/// TLS is always on; these only relax or pin certificate verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub ca_cert: Option<PathBuf>,
    pub insecure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub tls: TlsConfig,

    /// Bound for connecting and for every single database call.
    pub timeout: Duration,
}

impl ConnectOptions {
    pub const DEFAULT_PORT: u16 = 3306;
    pub const DEFAULT_USER: &'static str = "db-ping";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            user: Self::DEFAULT_USER.to_string(),
            password: String::new(),
            database: None,
            tls: TlsConfig::default(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}
