//! Prefix-based geolocation database.
//!
//! The database is a JSON array of entries, each a network prefix plus the
//! details reported for addresses inside it:
//!
//! ```json
//! [
//!   {"network": "8.8.8.0/24", "country": "United States", "asn": 15169,
//!    "asn_org": "GOOGLE", "flags": {"hosting": true}}
//! ]
//! ```
//!
//! Lookups pick the most specific matching prefix.

use crate::error::{AdapterError, AdapterResult, ConfigError, ConfigResult};
use crate::scanner::GeoLookup;
use crate::types::IpDetails;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::Path;

/// One prefix and its details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoEntry {
    pub network: String,
    #[serde(flatten)]
    pub details: IpDetails,
}

/// In-memory prefix table.
#[derive(Debug, Clone, Default)]
pub struct GeoDatabase {
    entries: Vec<(IpNetwork, IpDetails)>,
}

impl GeoDatabase {
    /// Load a database file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse a database from its JSON text.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let entries: Vec<GeoEntry> = serde_json::from_str(content)?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<GeoEntry>) -> ConfigResult<Self> {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let network: IpNetwork = entry.network.parse().map_err(|_| {
                    ConfigError::InvalidFormat(format!("invalid network '{}'", entry.network))
                })?;
                Ok((network, entry.details))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, ip: IpAddr) -> Option<&IpDetails> {
        self.entries
            .iter()
            .filter(|(network, _)| network.contains(ip))
            .max_by_key(|(network, _)| network.prefix())
            .map(|(_, details)| details)
    }
}

impl GeoLookup for GeoDatabase {
    fn lookup(&self, host: &str) -> AdapterResult<IpDetails> {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| AdapterError::InvalidAddress(host.to_string()))?;

        self.find(ip)
            .cloned()
            .ok_or_else(|| AdapterError::NotFound(host.to_string()))
    }
}
