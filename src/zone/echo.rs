//! Echo zones: every address has a name.
//!
//! The labels in front of the zone spell the address to answer with, so
//! `192.0.2.7.echo.example.com` resolves to `192.0.2.7`. IPv6 addresses use `-` (or `.`) where
//! the address has a `:`, e.g. `2001-db8--1.echo.example.com` resolves to `2001:db8::1`.
use crate::error::Error;
use crate::zone::{address_record, Placement, ZoneApex};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use trust_dns_server::client::rr::{LowerName, Record};

/// Decoded addresses never change, so they are cached for a week.
pub const ECHO_TTL: u32 = 604_800;

/// Decode the address spelled by the labels in front of an echo zone.
///
/// Tried in order: a dotted quad; IPv6 ending in a dotted quad, with every `-` and all but the
/// last three `.` read as `:` (e.g. `--ffff-192.0.2.7`); IPv6 with every `-` and `.` read as
/// `:`.
///
/// # Errors
///
/// Returns [`Error::MalformedQuery`] if no address can be decoded.
pub fn decode_address(local: &str) -> Result<IpAddr, Error> {
    if let Ok(v4) = local.parse::<Ipv4Addr>() {
        return Ok(v4.into());
    }

    let dots = local.matches('.').count();
    if dots >= 3 {
        let mut seen = 0;
        let dotted_tail: String = local
            .chars()
            .map(|c| match c {
                '-' => ':',
                '.' => {
                    seen += 1;
                    if seen <= dots - 3 {
                        ':'
                    } else {
                        '.'
                    }
                }
                c => c,
            })
            .collect();
        if let Ok(v6) = dotted_tail.parse::<Ipv6Addr>() {
            return Ok(v6.into());
        }
    }

    let colons: String = local
        .chars()
        .map(|c| if c == '-' || c == '.' { ':' } else { c })
        .collect();
    colons
        .parse::<Ipv6Addr>()
        .map(IpAddr::from)
        .map_err(|_| Error::MalformedQuery(local.to_string()))
}

pub struct EchoResponder {
    apex: ZoneApex,
}

impl EchoResponder {
    #[must_use]
    pub fn new(apex: ZoneApex) -> Self {
        EchoResponder { apex }
    }

    #[must_use]
    pub fn apex(&self) -> &ZoneApex {
        &self.apex
    }

    #[must_use]
    pub fn resolve(&self, name: &LowerName) -> Vec<Record> {
        match self.apex.place(name) {
            Placement::Apex => self.apex.records(),
            Placement::Outside => Vec::default(),
            Placement::Within(local) => match decode_address(&local) {
                Ok(ip) => vec![address_record(name, ip, ECHO_TTL)],
                Err(err) => {
                    tracing::debug!("echo {name}: {err}");
                    Vec::default()
                }
            },
        }
    }
}
