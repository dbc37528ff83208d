//! Bundled enrichment collaborators.
//!
//! - [`GeoDatabase`]: geolocation and network ownership from a local file
//! - [`CensysClient`]: third-party host intelligence over HTTP

mod censys;
mod geo;

pub use censys::{parse_host_response, CensysClient, IntelCredentials};
pub use geo::{GeoDatabase, GeoEntry};
