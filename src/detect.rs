//! Default service detector.
//!
//! Names a reachable port after its well-known service and, for TCP, reads
//! the service banner and matches it against a small keyword table to
//! derive OS, manufacturer and device hints plus sensitive findings.

use crate::banner::grab_banner;
use crate::scanner::{ServiceDetector, TcpConnectProber};
use crate::services::service_tag;
use crate::types::{Port, Protocol, ServiceObservation};
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

/// What a banner keyword implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hint {
    Tag(&'static str),
    Os(&'static str),
    Manufacturer(&'static str),
    DeviceType(&'static str),
    Sensitive(&'static str),
}

/// Case-insensitive banner keywords. A keyword may carry several hints.
const BANNER_HINTS: &[(&str, &[Hint])] = &[
    ("openssh", &[Hint::Tag("openssh")]),
    ("ssh-1.", &[Hint::Sensitive("ssh_protocol_v1")]),
    ("ubuntu", &[Hint::Os("Ubuntu")]),
    ("debian", &[Hint::Os("Debian")]),
    ("centos", &[Hint::Os("CentOS")]),
    ("freebsd", &[Hint::Os("FreeBSD")]),
    ("microsoft", &[Hint::Os("Windows")]),
    ("win32", &[Hint::Os("Windows")]),
    ("nginx", &[Hint::Tag("nginx")]),
    ("apache", &[Hint::Tag("apache")]),
    ("iis", &[Hint::Tag("iis"), Hint::Os("Windows")]),
    ("proftpd", &[Hint::Tag("proftpd")]),
    ("vsftpd", &[Hint::Tag("vsftpd")]),
    ("mikrotik", &[Hint::Manufacturer("MikroTik"), Hint::DeviceType("router"), Hint::Os("RouterOS")]),
    ("routeros", &[Hint::Os("RouterOS"), Hint::DeviceType("router")]),
    ("hikvision", &[Hint::Manufacturer("Hikvision"), Hint::DeviceType("camera")]),
    ("dahua", &[Hint::Manufacturer("Dahua"), Hint::DeviceType("camera")]),
    ("synology", &[Hint::Manufacturer("Synology"), Hint::DeviceType("nas")]),
    ("qnap", &[Hint::Manufacturer("QNAP"), Hint::DeviceType("nas")]),
    ("jetdirect", &[Hint::Manufacturer("HP"), Hint::DeviceType("printer")]),
    ("cisco", &[Hint::Manufacturer("Cisco"), Hint::DeviceType("network")]),
    ("index of /", &[Hint::Sensitive("directory_listing")]),
    ("anonymous", &[Hint::Sensitive("anonymous_login")]),
    ("-err unknown command", &[Hint::Tag("redis")]),
    ("-noauth", &[Hint::Tag("redis")]),
];

/// Services whose protocol sends credentials in the clear.
const CLEARTEXT_SERVICES: &[&str] = &["ftp", "telnet", "pop3", "imap"];

/// Port-table plus banner-keyword detector.
#[derive(Debug, Clone)]
pub struct BannerDetector {
    connector: TcpConnectProber,
    read_timeout: Duration,
}

impl BannerDetector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            connector: TcpConnectProber::new(timeout),
            read_timeout: timeout,
        }
    }

    async fn banner(&self, host: &str, port: Port) -> Option<String> {
        let stream = self.connector.connect(host, port).await.ok()?;
        grab_banner(stream, port.as_u16(), self.read_timeout).await
    }
}

#[async_trait]
impl ServiceDetector for BannerDetector {
    async fn detect(&self, host: &str, port: Port, protocol: Protocol) -> Vec<ServiceObservation> {
        let service = service_tag(port.as_u16(), protocol);
        let mut observation = ServiceObservation::tagged(service);

        if CLEARTEXT_SERVICES.contains(&service) {
            observation.sensitive_info.push("cleartext_auth".to_string());
        }

        if protocol == Protocol::Tcp {
            if let Some(banner) = self.banner(host, port).await {
                trace!(host, port = port.as_u16(), %banner, "banner");
                apply_banner_hints(&mut observation, &banner);
            }
        }

        vec![observation]
    }
}

/// Fold every matching keyword hint into an observation.
fn apply_banner_hints(observation: &mut ServiceObservation, banner: &str) {
    let banner = banner.to_ascii_lowercase();

    for (keyword, hints) in BANNER_HINTS {
        if !banner.contains(keyword) {
            continue;
        }
        for hint in *hints {
            match *hint {
                Hint::Tag(tag) => push_unique(&mut observation.types, tag),
                Hint::Sensitive(id) => push_unique(&mut observation.sensitive_info, id),
                Hint::Os(os) => observation.os = Some(os.to_string()),
                Hint::Manufacturer(m) => observation.manufacturer = Some(m.to_string()),
                Hint::DeviceType(d) => observation.device_type = Some(d.to_string()),
            }
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_ssh_banner_hints() {
        let mut obs = ServiceObservation::tagged("ssh");
        apply_banner_hints(&mut obs, "SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.6");
        assert_eq!(obs.types, vec!["ssh", "openssh"]);
        assert_eq!(obs.os.as_deref(), Some("Ubuntu"));
        assert!(obs.sensitive_info.is_empty());
    }

    #[test]
    fn test_device_hints() {
        let mut obs = ServiceObservation::tagged("http");
        apply_banner_hints(&mut obs, "HTTP/1.1 401 Unauthorized Server: Hikvision-Webs");
        assert_eq!(obs.manufacturer.as_deref(), Some("Hikvision"));
        assert_eq!(obs.device_type.as_deref(), Some("camera"));
    }

    #[test]
    fn test_no_hints_leave_observation_alone() {
        let mut obs = ServiceObservation::tagged("unknown");
        apply_banner_hints(&mut obs, "hello");
        assert_eq!(obs, ServiceObservation::tagged("unknown"));
    }

    #[tokio::test]
    async fn test_udp_detection_uses_port_table() {
        let detector = BannerDetector::new(Duration::from_millis(100));
        let port = Port::new(161).unwrap();
        let observations = detector.detect("127.0.0.1", port, Protocol::Udp).await;
        assert_eq!(observations, vec![ServiceObservation::tagged("snmp")]);
    }

    #[tokio::test]
    async fn test_tcp_detection_reads_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"220 (vsFTPd 3.0.3) anonymous access granted\r\n")
                .await
                .unwrap();
        });

        let detector = BannerDetector::new(Duration::from_secs(1));
        let observations = detector.detect("127.0.0.1", port, Protocol::Tcp).await;
        assert_eq!(observations.len(), 1);
        assert!(observations[0].types.contains(&"vsftpd".to_string()));
        assert_eq!(observations[0].sensitive_info, vec!["anonymous_login"]);
    }
}
