use crate::error::Error;
use crate::registry::zone_dir;
use axum::response::{IntoResponse, Response};
use std::net::IpAddr;
use std::str::FromStr;
use trust_dns_server::client::rr::{LowerName, Name};

/// A name registered in a zone, rendered as `<name>.<zone>\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Registration {
    pub name: String,
    pub zone: LowerName,
}

impl IntoResponse for Registration {
    fn into_response(self) -> Response {
        format!("{}.{}\n", self.name, zone_dir(&self.zone)).into_response()
    }
}

/// The zone named by a `Host` header, without any port.
pub(super) fn zone_from_host(host: &str) -> Result<LowerName, Error> {
    let hostname = match host.rsplit_once(':') {
        Some((hostname, port)) if port.bytes().all(|b| b.is_ascii_digit()) => hostname,
        _ => host,
    };
    let is_domain_like = hostname
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.');
    if hostname.is_empty() || !is_domain_like || IpAddr::from_str(hostname).is_ok() {
        return Err(Error::InvalidHost(host.to_string()));
    }
    let mut name = Name::from_str(hostname).map_err(|_| Error::InvalidHost(host.to_string()))?;
    name.set_fqdn(true);
    Ok(LowerName::from(name))
}
