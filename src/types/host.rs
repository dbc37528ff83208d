//! Host records and the data collaborators hand back to the orchestrator.

use super::port::{Port, Protocol};
use serde::{Deserialize, Serialize};

/// One open (host, port, protocol) observation with its service metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortFinding {
    pub port: Port,
    pub protocol: Protocol,
    /// Service type tags, e.g. `http`, `ssh`.
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitive_info: Vec<String>,
}

impl PortFinding {
    /// A finding with no service metadata.
    pub fn new(port: Port, protocol: Protocol) -> Self {
        Self {
            port,
            protocol,
            types: Vec::new(),
            os: None,
            manufacturer: None,
            device_type: None,
            sensitive_info: Vec::new(),
        }
    }

    /// Attach a service observation made on this port.
    pub fn observed(port: Port, protocol: Protocol, observation: ServiceObservation) -> Self {
        Self {
            port,
            protocol,
            types: observation.types,
            os: observation.os,
            manufacturer: observation.manufacturer,
            device_type: observation.device_type,
            sensitive_info: observation.sensitive_info,
        }
    }

    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.types.push(tag.into());
        self
    }
}

/// What a service detector reports about one reachable port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceObservation {
    pub types: Vec<String>,
    pub os: Option<String>,
    pub manufacturer: Option<String>,
    pub device_type: Option<String>,
    pub sensitive_info: Vec<String>,
}

impl ServiceObservation {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            types: vec![tag.into()],
            ..Self::default()
        }
    }
}

/// Geolocation and network-ownership attributes of an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_radius: Option<u16>,
}

/// Risk flags reported by the enrichment source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFlags {
    pub anonymous: bool,
    pub anonymous_vpn: bool,
    pub hosting: bool,
    pub proxy: bool,
    pub tor_exit: bool,
}

impl RiskFlags {
    /// Host tags for the flags that are set, in a fixed order.
    pub fn tags(&self) -> Vec<&'static str> {
        [
            (self.anonymous, "anonymous"),
            (self.anonymous_vpn, "vpn"),
            (self.hosting, "hosting"),
            (self.proxy, "proxy"),
            (self.tor_exit, "tor_exit"),
        ]
        .into_iter()
        .filter_map(|(set, tag)| set.then_some(tag))
        .collect()
    }
}

/// Result of a geo/network enrichment lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpDetails {
    #[serde(flatten)]
    pub geo: GeoDetails,
    #[serde(default)]
    pub flags: RiskFlags,
}

/// A third-party snapshot of one host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntelData {
    pub services: Vec<PortFinding>,
    pub labels: Vec<String>,
    pub os: Option<String>,
    pub manufacturer: Option<String>,
    pub device_type: Option<String>,
    pub geo: Option<GeoDetails>,
}

/// Everything known about one address in an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub ip: String,
    pub tags: Vec<String>,
    pub ports: Vec<PortFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitive_info: Vec<String>,
}

impl HostRecord {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            tags: Vec::new(),
            ports: Vec::new(),
            geo: None,
            os: None,
            manufacturer: None,
            device_type: None,
            sensitive_info: Vec::new(),
        }
    }

    /// Build a record from an intelligence snapshot.
    pub fn from_intel(ip: impl Into<String>, data: IntelData) -> Self {
        let mut record = Self::new(ip);
        for label in data.labels {
            record.add_tag(label);
        }
        for service in &data.services {
            for tag in &service.types {
                record.add_tag(tag.clone());
            }
        }
        record.ports = data.services;
        record.os = data.os;
        record.manufacturer = data.manufacturer;
        record.device_type = data.device_type;
        record.geo = data.geo;
        record
    }

    /// Copy enrichment details onto the record and tag its risk flags.
    pub fn apply_details(&mut self, details: IpDetails) {
        self.geo = Some(details.geo);
        for tag in details.flags.tags() {
            self.tags.push(tag.to_string());
        }
    }

    /// Add a tag unless an equal one is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn has_port(&self, port: Port) -> bool {
        self.ports.iter().any(|p| p.port == port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(n: u16) -> Port {
        Port::new(n).unwrap()
    }

    #[test]
    fn test_risk_flag_tags() {
        let flags = RiskFlags {
            anonymous_vpn: true,
            tor_exit: true,
            ..RiskFlags::default()
        };
        assert_eq!(flags.tags(), vec!["vpn", "tor_exit"]);
        assert!(RiskFlags::default().tags().is_empty());
    }

    #[test]
    fn test_apply_details() {
        let mut record = HostRecord::new("8.8.8.8");
        let details = IpDetails {
            geo: GeoDetails {
                country: Some("United States".into()),
                asn: Some(15169),
                ..GeoDetails::default()
            },
            flags: RiskFlags {
                hosting: true,
                ..RiskFlags::default()
            },
        };
        record.apply_details(details);
        assert_eq!(record.tags, vec!["hosting"]);
        assert_eq!(record.geo.as_ref().and_then(|g| g.asn), Some(15169));
    }

    #[test]
    fn test_add_tag_dedups() {
        let mut record = HostRecord::new("10.0.0.1");
        assert!(record.add_tag("http"));
        assert!(!record.add_tag("http"));
        assert_eq!(record.tags.len(), 1);
    }

    #[test]
    fn test_from_intel() {
        let data = IntelData {
            services: vec![
                PortFinding::new(port(22), Protocol::Tcp).with_type("ssh"),
                PortFinding::new(port(53), Protocol::Udp).with_type("dns"),
            ],
            labels: vec!["remote-access".into(), "ssh".into()],
            os: Some("Ubuntu".into()),
            ..IntelData::default()
        };
        let record = HostRecord::from_intel("1.1.1.1", data);
        assert_eq!(record.tags, vec!["remote-access", "ssh", "dns"]);
        assert!(record.has_port(port(53)));
        assert_eq!(record.os.as_deref(), Some("Ubuntu"));
    }

    #[test]
    fn test_details_deserialize_flat() {
        let details: IpDetails = serde_json::from_str(
            r#"{"country": "Germany", "city": "Berlin", "flags": {"proxy": true}}"#,
        )
        .unwrap();
        assert_eq!(details.geo.city.as_deref(), Some("Berlin"));
        assert!(details.flags.proxy);
    }
}
