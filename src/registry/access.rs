//! Subnet filtered registration, the only way names are written to the registry.
use crate::error::Error;
use crate::registry::SharedRegistry;
use ipnetwork::IpNetwork;
use std::collections::HashMap;
use std::net::IpAddr;
use trust_dns_server::client::rr::LowerName;

/// Registers names on behalf of clients, for clients within their zone's allowed subnet.
#[derive(Clone)]
pub struct Registrar {
    registry: SharedRegistry,
    subnets: HashMap<LowerName, IpNetwork>,
}

impl Registrar {
    /// Create a registrar for the zones of `registry`, each paired with the subnet allowed to
    /// register names in it. Zones without a subnet are unknown to the registrar.
    #[must_use]
    pub fn new(registry: SharedRegistry, subnets: HashMap<LowerName, IpNetwork>) -> Self {
        Registrar { registry, subnets }
    }

    /// Whether any zone accepts registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty()
    }

    /// Register (or confirm) a name for `requestor` in `zone`, returning the name without the
    /// zone suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownZone`] if `zone` doesn't accept registrations,
    /// [`Error::Forbidden`] if `requestor` is outside of the zone's subnet, and
    /// [`Error::ZoneFull`] if the zone has no free names left.
    pub async fn register(&self, zone: &LowerName, requestor: IpAddr) -> Result<String, Error> {
        let subnet = self
            .subnets
            .get(zone)
            .ok_or_else(|| Error::UnknownZone(zone.clone()))?;
        // Dual-stack listeners see IPv4 clients as mapped IPv6 addresses. Either form may match
        // the subnet, names are always derived from the canonical one.
        let canonical = requestor.to_canonical();
        if !(subnet.contains(requestor) || subnet.contains(canonical)) {
            tracing::debug!("rejected registration from {canonical} in {zone}");
            return Err(Error::Forbidden(canonical, zone.clone()));
        }
        self.registry.assign_or_confirm(zone, canonical).await
    }
}
