//! Words zones: names registered through the [HTTP API][crate::api].
use crate::error::Error;
use crate::registry::SharedRegistry;
use crate::zone::{address_record, Placement, ZoneApex};
use trust_dns_server::client::rr::{LowerName, Record};

/// Registrations can be reassigned by hand, keep caches short.
pub const WORDS_TTL: u32 = 120;

pub struct WordsResponder {
    apex: ZoneApex,
    registry: SharedRegistry,
}

impl WordsResponder {
    #[must_use]
    pub fn new(apex: ZoneApex, registry: SharedRegistry) -> Self {
        WordsResponder { apex, registry }
    }

    #[must_use]
    pub fn apex(&self) -> &ZoneApex {
        &self.apex
    }

    pub async fn resolve(&self, name: &LowerName) -> Vec<Record> {
        let local = match self.apex.place(name) {
            Placement::Apex => return self.apex.records(),
            Placement::Outside => return Vec::default(),
            Placement::Within(local) => local,
        };
        match self.registry.lookup(&self.apex.domain, &local).await {
            Ok(ip) => {
                tracing::debug!("got {ip} for {name}");
                vec![address_record(name, ip, WORDS_TTL)]
            }
            Err(Error::NotRegistered(_)) => Vec::default(),
            Err(err) => {
                tracing::warn!("lookup of {name} failed: {err}");
                Vec::default()
            }
        }
    }
}
