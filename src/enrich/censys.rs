//! Censys Search host lookups.
//!
//! Endpoint used:
//! - GET {api}/v2/hosts/{ip}   - current host view (HTTP basic auth)

use crate::error::{AdapterError, AdapterResult};
use crate::scanner::HostIntel;
use crate::types::{GeoDetails, IntelData, Port, PortFinding, Protocol};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// API id and secret for the intelligence service.
#[derive(Clone)]
pub struct IntelCredentials {
    pub api_id: String,
    pub secret: String,
}

impl IntelCredentials {
    /// Credentials are usable only when both halves are present.
    pub fn new(api_id: Option<String>, secret: Option<String>) -> Option<Self> {
        match (api_id, secret) {
            (Some(api_id), Some(secret)) if !api_id.is_empty() && !secret.is_empty() => {
                Some(Self { api_id, secret })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for IntelCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntelCredentials")
            .field("api_id", &self.api_id)
            .field("secret", &"***")
            .finish()
    }
}

// ── Response types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct HostResponse {
    result: CensysHost,
}

#[derive(Debug, Deserialize)]
struct CensysHost {
    #[serde(default)]
    services: Vec<CensysService>,
    #[serde(default)]
    labels: Vec<String>,
    location: Option<Location>,
    autonomous_system: Option<AutonomousSystem>,
    operating_system: Option<Software>,
}

#[derive(Debug, Deserialize)]
struct CensysService {
    port: u16,
    service_name: Option<String>,
    extended_service_name: Option<String>,
    transport_protocol: Option<String>,
    software: Option<Vec<Software>>,
}

#[derive(Debug, Deserialize)]
struct Location {
    continent: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    province: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    timezone: Option<String>,
    coordinates: Option<Coordinates>,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct AutonomousSystem {
    asn: Option<u32>,
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Software {
    vendor: Option<String>,
    product: Option<String>,
}

impl CensysService {
    fn into_finding(self) -> Option<PortFinding> {
        let port = Port::new(self.port)?;
        let protocol = match self.transport_protocol.as_deref() {
            Some(p) if p.eq_ignore_ascii_case("udp") => Protocol::Udp,
            _ => Protocol::Tcp,
        };

        let mut finding = PortFinding::new(port, protocol);
        for name in [self.service_name, self.extended_service_name]
            .into_iter()
            .flatten()
        {
            let tag = name.to_ascii_lowercase();
            if !finding.types.contains(&tag) {
                finding.types.push(tag);
            }
        }

        if let Some(software) = self.software.unwrap_or_default().into_iter().next() {
            finding.manufacturer = software.vendor;
        }

        Some(finding)
    }
}

impl From<CensysHost> for IntelData {
    fn from(host: CensysHost) -> Self {
        let mut geo = GeoDetails::default();
        let mut has_geo = false;

        if let Some(location) = host.location {
            has_geo = true;
            geo.continent = location.continent;
            geo.country = location.country;
            geo.country_code = location.country_code;
            geo.region = location.province;
            geo.city = location.city;
            geo.postal_code = location.postal_code;
            geo.time_zone = location.timezone;
            if let Some(c) = location.coordinates {
                geo.latitude = Some(c.latitude);
                geo.longitude = Some(c.longitude);
            }
        }
        if let Some(asys) = host.autonomous_system {
            has_geo = true;
            geo.asn = asys.asn;
            geo.asn_org = asys.name;
            geo.isp = asys.description;
        }

        let (os, manufacturer) = match host.operating_system {
            Some(sw) => (sw.product, sw.vendor),
            None => (None, None),
        };

        Self {
            services: host
                .services
                .into_iter()
                .filter_map(CensysService::into_finding)
                .collect(),
            labels: host.labels,
            os,
            manufacturer,
            device_type: None,
            geo: has_geo.then_some(geo),
        }
    }
}

/// Decode a `/v2/hosts/{ip}` response body.
pub fn parse_host_response(body: &str) -> AdapterResult<IntelData> {
    let response: HostResponse = serde_json::from_str(body)?;
    Ok(response.result.into())
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Host-intelligence client for the Censys Search API.
pub struct CensysClient {
    http: Client,
    base_url: String,
    credentials: IntelCredentials,
}

impl CensysClient {
    /// Public API root.
    pub const DEFAULT_API_URL: &'static str = "https://search.censys.io/api";

    pub fn new(
        base_url: &str,
        credentials: IntelCredentials,
        timeout: Duration,
    ) -> AdapterResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("trawl/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn host_url(&self, ip: IpAddr) -> String {
        format!("{}/v2/hosts/{}", self.base_url, ip)
    }
}

#[async_trait]
impl HostIntel for CensysClient {
    fn name(&self) -> &str {
        "censys"
    }

    async fn lookup(&self, host: &str) -> AdapterResult<IntelData> {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| AdapterError::InvalidAddress(host.to_string()))?;

        let url = self.host_url(ip);
        debug!(%url, "censys host lookup");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.api_id, Some(&self.credentials.secret))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AdapterError::NotFound(host.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_host_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "code": 200,
        "status": "OK",
        "result": {
            "ip": "198.51.100.7",
            "services": [
                {"port": 22, "service_name": "SSH", "transport_protocol": "TCP",
                 "extended_service_name": "SSH",
                 "software": [{"vendor": "OpenBSD", "product": "OpenSSH"}]},
                {"port": 443, "service_name": "HTTP", "extended_service_name": "HTTPS",
                 "transport_protocol": "TCP"},
                {"port": 161, "service_name": "SNMP", "transport_protocol": "UDP"},
                {"port": 0, "service_name": "BOGUS"}
            ],
            "labels": ["remote-access"],
            "location": {
                "continent": "Europe", "country": "Netherlands", "country_code": "NL",
                "city": "Amsterdam", "timezone": "Europe/Amsterdam",
                "coordinates": {"latitude": 52.37, "longitude": 4.89}
            },
            "autonomous_system": {"asn": 64500, "name": "EXAMPLE-AS", "description": "Example Net"},
            "operating_system": {"vendor": "Canonical", "product": "Linux"}
        }
    }"#;

    #[test]
    fn test_parse_services() {
        let data = parse_host_response(SAMPLE).unwrap();
        assert_eq!(data.services.len(), 3);

        let ssh = &data.services[0];
        assert_eq!(ssh.port.as_u16(), 22);
        assert_eq!(ssh.types, vec!["ssh"]);
        assert_eq!(ssh.manufacturer.as_deref(), Some("OpenBSD"));

        assert_eq!(data.services[1].types, vec!["http", "https"]);
        assert_eq!(data.services[2].protocol, Protocol::Udp);
    }

    #[test]
    fn test_parse_metadata() {
        let data = parse_host_response(SAMPLE).unwrap();
        assert_eq!(data.labels, vec!["remote-access"]);
        assert_eq!(data.os.as_deref(), Some("Linux"));
        assert_eq!(data.manufacturer.as_deref(), Some("Canonical"));

        let geo = data.geo.unwrap();
        assert_eq!(geo.city.as_deref(), Some("Amsterdam"));
        assert_eq!(geo.asn, Some(64500));
        assert_eq!(geo.latitude, Some(52.37));
    }

    #[test]
    fn test_minimal_response() {
        let data = parse_host_response(r#"{"result": {}}"#).unwrap();
        assert!(data.services.is_empty());
        assert!(data.geo.is_none());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            parse_host_response("<html>"),
            Err(AdapterError::Decode(_))
        ));
    }

    #[test]
    fn test_credentials_need_both_halves() {
        assert!(IntelCredentials::new(Some("id".into()), None).is_none());
        assert!(IntelCredentials::new(Some("id".into()), Some(String::new())).is_none());
        let creds = IntelCredentials::new(Some("id".into()), Some("s3cret".into())).unwrap();
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }

    #[tokio::test]
    async fn test_non_ip_host_rejected() {
        let creds = IntelCredentials::new(Some("id".into()), Some("secret".into())).unwrap();
        let client =
            CensysClient::new(CensysClient::DEFAULT_API_URL, creds, Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.host_url("192.0.2.1".parse().unwrap()),
            "https://search.censys.io/api/v2/hosts/192.0.2.1"
        );
        assert!(matches!(
            client.lookup("example.com").await,
            Err(AdapterError::InvalidAddress(_))
        ));
    }
}
