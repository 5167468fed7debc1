//! Error types.

use std::net::IpAddr;
use std::path::PathBuf;
use trust_dns_server::client::rr::LowerName;
use trust_dns_server::proto::error::ProtoError;

/// Error enumerates the possible Word Crab error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a registration or lookup references a zone that isn't a
    /// [words zone][`crate::config::ZoneKind::Words`] in the [`Config`][crate::config::Config].
    #[error("no such zone: \"{0}\"")]
    UnknownZone(LowerName),

    /// Returned when clients `GET` the [`/register` API endpoint][crate::api#register-get] with
    /// a `Host` that isn't a domain name.
    #[error("invalid host: \"{0}\"")]
    InvalidHost(String),

    /// Returned when clients `GET` the [`/register` API endpoint][crate::api#register-get] from
    /// a source IP address outside of the zone's configured subnet.
    #[error("IP {0} is not allowed to register names in \"{1}\"")]
    Forbidden(IpAddr, LowerName),

    /// Returned when every slot of a zone's name space is held by another address. The zone
    /// needs a larger arity or a bigger word list.
    #[error("no free name left in \"{0}\"")]
    ZoneFull(LowerName),

    /// Returned when looking up a name that has no (valid) registration.
    #[error("name not registered: \"{0}\"")]
    NotRegistered(String),

    /// Returned when a slot's stored content isn't an IP address. Registrations recover from
    /// this by reclaiming the slot.
    #[error("slot \"{name}\" holds invalid content: {content:?}")]
    CorruptSlot { name: String, content: String },

    /// Returned when an echo zone query doesn't embed a valid IP address.
    #[error("no IP address encoded in \"{0}\"")]
    MalformedQuery(String),

    /// Returned when a word list can't be used to build names.
    #[error("invalid word list: {0}")]
    InvalidWordList(String),

    /// Returned when a words zone has no word list configured, and no `data_dir` to fall
    /// back to.
    #[error("no word list configured for \"{0}\"")]
    MissingWordList(LowerName),

    /// Returned when a name space would have fewer than two slots per word or no words at all.
    #[error("degenerate name space: {parts} part(s) of range {range}")]
    DegenerateNameSpace { parts: u32, range: usize },

    /// Returned when `range ^ parts` doesn't fit the 128 bit hash space.
    #[error("name space of {parts} part(s) of range {range} is too large")]
    NameSpaceOverflow { parts: u32, range: usize },

    /// Returned when the same zone appears twice in the configuration.
    #[error("zone configured more than once: \"{0}\"")]
    DuplicateZone(LowerName),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when an IO error occurs on a known path.
    #[error("an IO error occurred on {0}")]
    PathIO(PathBuf, #[source] std::io::Error),

    /// Returned when [trying to load a `Config`][crate::config::Config::try_from_file] fails
    /// due to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the Word Crab DNS server encounters a generic DNS protocol error.
    #[error("DNS error")]
    DNSError(#[from] ProtoError),
}
