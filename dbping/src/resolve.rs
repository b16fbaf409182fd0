use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::proto::rr::{Record, RecordType};

/// Bound for the informational DNS queries; they never delay the run by more than this.
const DNS_TIMEOUT: Duration = Duration::from_secs(3);

/// What DNS says about the configured host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostAddrs {
    /// The host was given as an IP address; only a reverse lookup is done.
    Literal {
        ip: IpAddr,
        reverse_name: Option<String>,
    },
    Resolved {
        ips: Vec<IpAddr>,
        record: Option<DnsRecord>,
    },
}

/// Answer of a direct DNS query for the host name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DnsRecord {
    /// Owner name of the address records, after following any CNAME chain.
    pub canonical_name: String,
    pub expires_in: Duration,
}

impl HostAddrs {
    pub(crate) fn addresses(&self) -> Vec<IpAddr> {
        match self {
            Self::Literal { ip, .. } => vec![*ip],
            Self::Resolved { ips, .. } => ips.clone(),
        }
    }

    pub(crate) fn reverse_name(&self) -> Option<&str> {
        match self {
            Self::Literal { reverse_name, .. } => reverse_name.as_deref(),
            Self::Resolved { .. } => None,
        }
    }

    pub(crate) fn record(&self) -> Option<&DnsRecord> {
        match self {
            Self::Literal { .. } => None,
            Self::Resolved { record, .. } => record.as_ref(),
        }
    }
}

impl fmt::Display for HostAddrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal {
                reverse_name: Some(name),
                ..
            } => f.write_str(name),
            Self::Literal { ip, .. } => write!(f, "{ip} has no reverse DNS name"),
            Self::Resolved { ips, .. } => {
                let joined = ips
                    .iter()
                    .map(IpAddr::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                f.write_str(&joined)
            }
        }
    }
}

/// Forward lookup through the system resolver, plus the DNS details that explain it.
///
/// Only the forward lookup can fail; reverse names and record details are best effort.
pub(crate) async fn lookup(host: &str, port: u16) -> std::io::Result<HostAddrs> {
    if let Some(ip) = ip_literal(host) {
        return Ok(HostAddrs::Literal {
            ip,
            reverse_name: reverse_name(ip).await,
        });
    }

    let addrs = tokio::net::lookup_host((host, port)).await?;
    Ok(HostAddrs::Resolved {
        ips: unique_ips(addrs.map(|a| a.ip())),
        record: dns_record(host).await,
    })
}

fn ip_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}

fn resolver() -> Option<TokioAsyncResolver> {
    match TokioAsyncResolver::tokio_from_system_conf() {
        Ok(resolver) => Some(resolver),
        Err(err) => {
            tracing::debug!("no DNS resolver configuration: {err}");
            None
        }
    }
}

async fn reverse_name(ip: IpAddr) -> Option<String> {
    let resolver = resolver()?;
    match tokio::time::timeout(DNS_TIMEOUT, resolver.reverse_lookup(ip)).await {
        Ok(Ok(names)) => names.iter().next().map(ToString::to_string),
        Ok(Err(err)) => {
            tracing::debug!(%ip, "reverse lookup failed: {err}");
            None
        }
        Err(_) => {
            tracing::debug!(%ip, "reverse lookup timed out");
            None
        }
    }
}

async fn dns_record(host: &str) -> Option<DnsRecord> {
    let resolver = resolver()?;
    let answer = match tokio::time::timeout(DNS_TIMEOUT, resolver.lookup_ip(host)).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(err)) => {
            tracing::debug!(host, "DNS query failed: {err}");
            return None;
        }
        Err(_) => {
            tracing::debug!(host, "DNS query timed out");
            return None;
        }
    };

    let records = answer.as_lookup().records();
    Some(DnsRecord {
        canonical_name: canonical_name(records).unwrap_or_else(|| host.to_string()),
        expires_in: answer
            .valid_until()
            .saturating_duration_since(std::time::Instant::now()),
    })
}

fn canonical_name(records: &[Record]) -> Option<String> {
    records
        .iter()
        .find(|r| matches!(r.record_type(), RecordType::A | RecordType::AAAA))
        .map(|r| r.name().to_string())
}

/// Keeps the first occurrence of each address, in resolver order.
fn unique_ips(ips: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut out: Vec<IpAddr> = Vec::new();
    for ip in ips {
        if !out.contains(&ip) {
            out.push(ip);
        }
    }
    out
}
