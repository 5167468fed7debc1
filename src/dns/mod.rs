//! Authoritative DNS server for the configured zones.
//!
//! Each query is answered by the [zone responder][crate::zone] of the most specific configured
//! zone containing the query name. Queries for names outside of every zone are `REFUSED`, and
//! anything but a plain query gets `NOTIMP`.
//!
//! # Echo Zones
//!
//! Word Crab will serve `A` and `AAAA` records for any name below an echo zone that spells an IP
//! address, no registration needed.
//!
//! E.g. with config:
//! ```json
//! {
//!   "zones": [
//!     { "type": "echo", "domain": "echo.example.com", "ns_domain": "ns1.example.com" }
//!   ],
//!   ...
//! }
//! ```
//!
//! Queries would return:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 +short 192.0.2.7.echo.example.com A
//! 192.0.2.7
//! ❯ dig @127.0.0.1 -p 5353 +short 2001-db8--7.echo.example.com AAAA
//! 2001:db8::7
//! ```
//!
//! Names that don't spell an address get `NXDOMAIN`.
//!
//! # Words Zones
//!
//! Word Crab will serve `A` or `AAAA` records for names registered through the
//! [`/register` API endpoint][crate::api#register-get]. Registered names are served with a short
//! TTL since they may be reassigned by an administrator.
//!
//! ```bash
//! ❯ curl -6 http://words.example.com:8080/register
//! correct-horse-battery.words.example.com
//! ❯ dig @127.0.0.1 -p 5353 +short correct-horse-battery.words.example.com AAAA
//! 2001:db8::9
//! ```
//!
//! # Zone Apex
//!
//! ## NS, A/AAAA
//!
//! The apex of every zone has an `NS` record for the zone's
//! [`ns_domain`][`crate::config::ZoneConfig::ns_domain`], and an `A` or `AAAA` record for each of
//! its [`addrs`][`crate::config::ZoneConfig::addrs`].
//!
//! ## SOA
//!
//! Word Crab will serve a response to `SOA` class queries for the apex of each zone using the
//! zone's [`ns_domain`][`crate::config::ZoneConfig::ns_domain`] and
//! [`ns_admin`][`crate::config::ZoneConfig::ns_admin`] settings.
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 echo.example.com +short SOA
//! ns1.example.com. dns-admin.example.com. 20230312 86400 7200 3600000 172800
//! ```
//!
//! _Note: The zone serial (`20230312`) will differ based on the date the query is performed._

mod handlers;
pub mod server;

pub use server::new;
