//! HTTP API for registering names in words zones.
//!
//! # API Endpoints
//!
//! ## `/` (GET)
//!
//!   Returns the content of the configured
//!   [`Config::readme_path`][`crate::config::Config::readme_path`] file, or HTTP 404 (Not Found)
//!   when there is none.
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/register` (GET)
//!
//!   Registers a name for the client's source IP address in the zone named by the request's
//!   `Host` header. A client keeps getting the same name for the same address.
//!
//!   ```bash
//!   ❯ curl -6 http://words.example.com:8080/register
//!   correct-horse-battery.words.example.com
//!   ```
//!
//!   Returns HTTP 200 (OK) and a text body of the form `<name>.<zone>\n` on success. Failures
//!   have a JSON body of the form `{"error": "..."}` and one of the statuses:
//!
//!   * 400 (Bad Request): the `Host` isn't a words zone.
//!   * 403 (Forbidden): the client is outside the zone's configured `subnet`.
//!   * 507 (Insufficient Storage): every name of the zone is taken.
//!   * 500 (Internal Server Error): anything else.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
