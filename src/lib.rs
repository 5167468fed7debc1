//! Word Crab
//!
//! A small dynamic DNS naming service. Clients get a short, memorable name for their IP address
//! with a single HTTP request, e.g. `correct-horse-battery.words.example.com`, served from then on
//! by Word Crab's authoritative DNS server.
//!
//! Two kinds of zones are supported:
//!
//! * **words** zones, where names are made of words from a word list and registered through the
//!   [HTTP API][crate::api]. Names are picked deterministically from the client's address by the
//!   [allocator][crate::allocator] and persisted by the [registry][crate::registry].
//! * **echo** zones, where the name is the address, e.g. `192.0.2.7.echo.example.com`, and no
//!   registration is needed.
//!
//! See [`dns`] for the records served.
#![warn(clippy::pedantic)]

pub mod allocator;
pub mod api;
pub mod config;
#[doc(hidden)]
pub mod crab;
pub mod dns;
pub mod error;
pub mod registry;
pub mod slot_store;
pub mod word_table;
pub mod zone;

pub use api::new as new_http;
pub use config::{Config, Shared};
pub use dns::new as new_dns;
pub use registry::{NameRegistry, Registrar};
pub use slot_store::{FileSlotStore, InMemorySlotStore};
pub use zone::Zones;
