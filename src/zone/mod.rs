//! Zone responders.
//!
//! Each configured zone is answered by one [`Responder`]: an [`EchoResponder`] decodes the
//! address to answer with from the query name itself, a [`WordsResponder`] looks the name up in
//! the [`NameRegistry`][crate::registry::NameRegistry]. Both answer the zone apex with its `NS`
//! record and any static addresses, and have no answer for names outside of the zone.

use crate::config::{Config, ZoneKind};
use crate::error::Error;
use crate::registry::SharedRegistry;
use std::net::IpAddr;
use trust_dns_server::client::rr::{LowerName, Name, RData, Record};

pub mod echo;
pub mod words;

pub use echo::EchoResponder;
pub use words::WordsResponder;

/// TTL of the apex records.
pub const APEX_TTL: u32 = 604_800;

/// The static part of a zone: its name, nameserver and the records served at the apex.
#[derive(Debug, Clone)]
pub struct ZoneApex {
    pub domain: LowerName,
    pub ns_domain: LowerName,
    pub ns_admin: Name,
    pub addrs: Vec<IpAddr>,
}

/// Where a query name sits relative to a zone.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Apex,
    Outside,
    /// Below the apex. Holds the labels in front of the zone, joined by dots.
    Within(String),
}

/// An `A` or `AAAA` record for `ip`, depending on its version.
#[must_use]
pub fn address_record(name: &LowerName, ip: IpAddr, ttl: u32) -> Record {
    let rdata = match ip {
        IpAddr::V4(v4) => RData::A(v4),
        IpAddr::V6(v6) => RData::AAAA(v6),
    };
    Record::from_rdata(name.into(), ttl, rdata)
}

impl ZoneApex {
    pub(crate) fn place(&self, name: &LowerName) -> Placement {
        if *name == self.domain {
            return Placement::Apex;
        }
        if !self.domain.zone_of(name) {
            return Placement::Outside;
        }
        let name: Name = name.into();
        let domain: Name = (&self.domain).into();
        let local_labels = usize::from(name.num_labels().saturating_sub(domain.num_labels()));
        let local: Vec<String> = name
            .iter()
            .take(local_labels)
            .map(|label| String::from_utf8_lossy(label).into_owned())
            .collect();
        Placement::Within(local.join("."))
    }

    /// The `NS` record of the zone, followed by the static addresses of the apex.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        let ns = Record::from_rdata(
            (&self.domain).into(),
            APEX_TTL,
            RData::NS((&self.ns_domain).into()),
        );
        std::iter::once(ns)
            .chain(
                self.addrs
                    .iter()
                    .map(|ip| address_record(&self.domain, *ip, APEX_TTL)),
            )
            .collect()
    }
}

/// The responder of a zone.
pub enum Responder {
    Echo(EchoResponder),
    Words(WordsResponder),
}

impl Responder {
    #[must_use]
    pub fn apex(&self) -> &ZoneApex {
        match self {
            Responder::Echo(r) => r.apex(),
            Responder::Words(r) => r.apex(),
        }
    }

    /// Records for a fully qualified query name, of every type. Empty when the name doesn't
    /// exist in the zone.
    pub async fn resolve(&self, name: &LowerName) -> Vec<Record> {
        match self {
            Responder::Echo(r) => r.resolve(name),
            Responder::Words(r) => r.resolve(name).await,
        }
    }
}

/// Every configured zone.
#[derive(Default)]
pub struct Zones {
    responders: Vec<Responder>,
}

impl Zones {
    #[must_use]
    pub fn new(responders: Vec<Responder>) -> Self {
        Zones { responders }
    }

    /// Build the responders of every zone in `config`. Words zones answer from `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownZone`] if a words zone is missing from `registry`, and
    /// [`Error::DNSError`] for invalid admin mailboxes.
    pub fn from_config(config: &Config, registry: &SharedRegistry) -> Result<Self, Error> {
        let mut responders = Vec::with_capacity(config.zones.len());
        for zone in &config.zones {
            let apex = ZoneApex {
                domain: zone.fqdn(),
                ns_domain: zone.ns_fqdn(),
                ns_admin: zone.ns_admin()?,
                addrs: zone.addrs.clone(),
            };
            let responder = match zone.kind {
                ZoneKind::Echo => Responder::Echo(EchoResponder::new(apex)),
                ZoneKind::Words { .. } => {
                    if !registry.has_zone(&apex.domain) {
                        return Err(Error::UnknownZone(apex.domain));
                    }
                    Responder::Words(WordsResponder::new(apex, registry.clone()))
                }
            };
            responders.push(responder);
        }
        Ok(Zones { responders })
    }

    /// The responder of the most specific zone containing `name`.
    #[must_use]
    pub fn find(&self, name: &LowerName) -> Option<&Responder> {
        self.responders
            .iter()
            .filter(|r| r.apex().domain.zone_of(name))
            .max_by_key(|r| Name::from(&r.apex().domain).num_labels())
    }
}
