//! Scan → report → formatter, without touching the network.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use trawl::cli::OutputFormat;
use trawl::config::PortConfig;
use trawl::output::write_report;
use trawl::scanner::{PortProber, ServiceDetector};
use trawl::types::ServiceObservation;
use trawl::{Port, Protocol, ScanId, ScanReport, Scanner};

struct EvenHostsOpen;

#[async_trait]
impl PortProber for EvenHostsOpen {
    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }

    async fn probe(&self, host: &str, _port: Port) -> bool {
        host.rsplit('.')
            .next()
            .and_then(|octet| octet.parse::<u8>().ok())
            .is_some_and(|octet| octet % 2 == 0)
    }
}

struct NeverOpen;

#[async_trait]
impl PortProber for NeverOpen {
    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }

    async fn probe(&self, _: &str, _: Port) -> bool {
        false
    }
}

struct Ssh;

#[async_trait]
impl ServiceDetector for Ssh {
    async fn detect(&self, _: &str, _: Port, _: Protocol) -> Vec<ServiceObservation> {
        vec![ServiceObservation::tagged("ssh")]
    }
}

async fn report() -> ScanReport {
    let ports = PortConfig {
        tcp_ports: vec![Port::new(22).unwrap()],
        udp_ports: vec![Port::new(161).unwrap()],
    };
    let scanner = Scanner::new(&ports, Arc::new(EvenHostsOpen), Arc::new(NeverOpen), Arc::new(Ssh));

    let id = ScanId::new();
    let started_at = Utc::now();
    let hosts = scanner.scan_with_id(id, "10.0.0.0/28").await.unwrap();
    ScanReport::new(id, "10.0.0.0/28", started_at, hosts)
}

#[tokio::test]
async fn report_hosts_are_sorted() {
    let report = report().await;
    let ips: Vec<&str> = report.hosts.iter().map(|h| h.ip.as_str()).collect();
    assert_eq!(
        ips,
        vec![
            "10.0.0.2", "10.0.0.4", "10.0.0.6", "10.0.0.8", "10.0.0.10", "10.0.0.12", "10.0.0.14"
        ]
    );
    assert_eq!(report.port_count(), 7);
}

#[tokio::test]
async fn csv_has_a_row_per_finding() {
    let report = report().await;
    let mut buf = Vec::new();
    write_report(&mut buf, &report, OutputFormat::Csv).unwrap();

    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 1 + 7);
    assert!(text.lines().nth(1).unwrap().starts_with("10.0.0.2,22,tcp,ssh"));
}

#[tokio::test]
async fn json_round_trips() {
    let report = report().await;
    let mut buf = Vec::new();
    write_report(&mut buf, &report, OutputFormat::Json).unwrap();

    let parsed: ScanReport = serde_json::from_slice(&buf).unwrap();
    assert_eq!(parsed.id, report.id);
    assert_eq!(parsed.hosts, report.hosts);
}
