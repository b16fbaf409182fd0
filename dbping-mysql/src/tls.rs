use mysql_async::SslOpts;

use super::{Error, Result, TlsConfig};

pub(crate) fn ssl_opts(tls: &TlsConfig) -> Result<SslOpts> {
    if tls.insecure && tls.ca_cert.is_some() {
        return Err(Error::ConflictingTls);
    }

    let mut ssl = SslOpts::default();

    if let Some(path) = &tls.ca_cert {
        if !path.is_file() {
            return Err(Error::CaCertNotFound(path.clone()));
        }
        tracing::debug!(path = %path.display(), "using custom CA certificate");
        ssl = ssl
            .with_root_certs(vec![path.clone().into()])
            .with_disable_built_in_roots(true);
    }

    if tls.insecure {
        tracing::debug!("server certificate verification disabled");
        ssl = ssl
            .with_danger_accept_invalid_certs(true)
            .with_danger_skip_domain_validation(true);
    }

    Ok(ssl)
}
