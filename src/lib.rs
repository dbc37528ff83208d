//! # trawl - Concurrent Network Reconnaissance
//!
//! trawl takes a target (IP address, CIDR block, URL or domain name), probes
//! every address directly and, in parallel, asks a host-intelligence service
//! about the same addresses. Both views are merged into one inventory of
//! hosts with their open ports, service tags and device metadata.
//!
//! ## Features
//!
//! - **Two pipelines**: bounded-concurrency direct probes alongside a paced,
//!   sequential intelligence lookup
//! - **Flexible Targeting**: single IPs, URLs, domain names and CIDR blocks
//! - **Service detection**: well-known port names plus banner hints
//! - **Enrichment**: geo/network details from a prefix database
//! - **Multiple Output Formats**: plain text, JSON and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trawl::config::PortConfig;
//! use trawl::detect::BannerDetector;
//! use trawl::scanner::{Scanner, TcpConnectProber, UdpProber};
//!
//! #[tokio::main]
//! async fn main() {
//!     let timeout = Duration::from_secs(2);
//!     let scanner = Scanner::new(
//!         &PortConfig::default(),
//!         Arc::new(TcpConnectProber::new(timeout)),
//!         Arc::new(UdpProber::new(timeout)),
//!         Arc::new(BannerDetector::new(timeout)),
//!     );
//!
//!     for host in scanner.scan("192.168.1.0/28").await.unwrap() {
//!         println!("{} {:?}", host.ip, host.tags);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Core type definitions: ports, targets, host records
//! - [`scanner`] - The scan orchestrator, its pipelines and collaborator traits
//! - [`detect`] - Default service detector
//! - [`enrich`] - Geo database and host-intelligence adapters
//! - [`config`] - Port lists and application settings
//! - [`report`] / [`output`] - Scan reports and their formatting
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod detect;
pub mod enrich;
pub mod error;
pub mod logging;
pub mod output;
pub mod report;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use report::ScanReport;
pub use scanner::{Limits, Scanner};
pub use types::{HostRecord, Port, PortFinding, Protocol, ScanId, TargetSpec};
