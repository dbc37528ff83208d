//! Scan orchestration.
//!
//! A [`Scanner`] runs two pipelines over the same host list and fuses their
//! output:
//!
//! - the **direct-probe pipeline** fans out over hosts (bounded by
//!   [`Limits::hosts`]) and, inside each host, over ports (bounded by
//!   [`Limits::ports_per_host`]), collecting records over channels;
//! - the **intelligence pipeline** walks the hosts one at a time through a
//!   [`HostIntel`] source, paced by [`Limits::intel_interval`].
//!
//! A third limiter, [`Limits::scans`], bounds how many scans one scanner
//! runs at once. It is held for a whole scan and never by host or port
//! tasks, so the three levels cannot wait on each other.

mod host;
pub mod merge;
pub mod tcp;
pub mod traits;
pub mod udp;

pub use host::aggregate;
pub use merge::merge_results;
pub use tcp::TcpConnectProber;
pub use traits::{GeoLookup, HostIntel, PortProber, ServiceDetector};
pub use udp::UdpProber;

use crate::config::{AppSettings, PortConfig};
use crate::detect::BannerDetector;
use crate::enrich::{CensysClient, GeoDatabase, IntelCredentials};
use crate::error::{ScanError, ScanResult};
use crate::types::{parse_target, HostRecord, ScanId};
use host::HostPipeline;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

/// Maximum host pipelines in flight per scan.
pub const HOST_CONCURRENCY: usize = 20;
/// Maximum probes in flight per host.
pub const PORT_CONCURRENCY: usize = 100;
/// Maximum concurrent scans per scanner.
pub const SCAN_CONCURRENCY: usize = 10;
/// Minimum spacing between host-intelligence calls.
pub const INTEL_INTERVAL: Duration = Duration::from_millis(200);

/// Concurrency and pacing limits of a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub hosts: usize,
    pub ports_per_host: usize,
    pub scans: usize,
    pub intel_interval: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            hosts: HOST_CONCURRENCY,
            ports_per_host: PORT_CONCURRENCY,
            scans: SCAN_CONCURRENCY,
            intel_interval: INTEL_INTERVAL,
        }
    }
}

/// The scan orchestrator.
///
/// Construct one explicitly and share it by reference; it holds no global
/// state.
pub struct Scanner {
    pipeline: HostPipeline,
    intel: Option<Arc<dyn HostIntel>>,
    limits: Limits,
    scan_permits: Arc<Semaphore>,
}

impl Scanner {
    /// Create a scanner with the given port lists and collaborators.
    ///
    /// Geo enrichment and host intelligence start disabled.
    pub fn new(
        ports: &PortConfig,
        tcp: Arc<dyn PortProber>,
        udp: Arc<dyn PortProber>,
        detector: Arc<dyn ServiceDetector>,
    ) -> Self {
        let limits = Limits::default();
        Self {
            pipeline: HostPipeline {
                tcp,
                udp,
                detector,
                geo: None,
                tcp_ports: ports.tcp_ports.clone().into(),
                udp_ports: ports.udp_ports.clone().into(),
                port_concurrency: limits.ports_per_host,
            },
            intel: None,
            limits,
            scan_permits: Arc::new(Semaphore::new(limits.scans.max(1))),
        }
    }

    /// Enable geo/network enrichment.
    pub fn with_geo(mut self, geo: Arc<dyn GeoLookup>) -> Self {
        self.pipeline.geo = Some(geo);
        self
    }

    /// Enable the host-intelligence pipeline.
    pub fn with_intel(mut self, intel: Arc<dyn HostIntel>) -> Self {
        self.intel = Some(intel);
        self
    }

    /// Override the default limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.pipeline.port_concurrency = limits.ports_per_host;
        self.scan_permits = Arc::new(Semaphore::new(limits.scans.max(1)));
        self.limits = limits;
        self
    }

    /// Build a scanner with the bundled network adapters.
    ///
    /// A geo database that cannot be loaded, or an intelligence client that
    /// cannot be built, leaves that stage disabled with a warning.
    pub fn from_settings(
        settings: &AppSettings,
        ports: &PortConfig,
        credentials: Option<IntelCredentials>,
    ) -> Self {
        let timeout = settings.probe_timeout();
        let mut scanner = Self::new(
            ports,
            Arc::new(TcpConnectProber::new(timeout)),
            Arc::new(UdpProber::new(timeout)),
            Arc::new(BannerDetector::new(timeout)),
        );

        if settings.enable_geo {
            match settings.geo_database.as_deref() {
                Some(path) => match GeoDatabase::load(path) {
                    Ok(db) => {
                        debug!(path = %path.display(), entries = db.len(), "geo database loaded");
                        scanner = scanner.with_geo(Arc::new(db));
                    }
                    Err(e) => warn!(error = %e, "IP information lookup disabled"),
                },
                None => warn!("IP information lookup disabled: no geo database configured"),
            }
        }

        if settings.enable_intel {
            match credentials {
                Some(credentials) => {
                    match CensysClient::new(&settings.intel_api_url, credentials, timeout) {
                        Ok(client) => scanner = scanner.with_intel(Arc::new(client)),
                        Err(e) => warn!(error = %e, "host intelligence disabled"),
                    }
                }
                None => warn!("host intelligence disabled: no API credentials"),
            }
        }

        scanner
    }

    pub fn geo_enabled(&self) -> bool {
        self.pipeline.geo.is_some()
    }

    pub fn intel_enabled(&self) -> bool {
        self.intel.is_some()
    }

    /// Scan a target (address, block, URL or name) and return the merged
    /// inventory.
    ///
    /// Only a malformed target is an error; every collaborator failure is
    /// absorbed and shows up as missing data. Inventory order is
    /// unspecified.
    pub async fn scan(&self, target: &str) -> ScanResult<Vec<HostRecord>> {
        self.scan_with_id(ScanId::new(), target).await
    }

    /// [`scan`](Self::scan) under a caller-chosen id, so a report can carry
    /// the same id as the log span.
    pub async fn scan_with_id(&self, id: ScanId, target: &str) -> ScanResult<Vec<HostRecord>> {
        self.scan_target(target)
            .instrument(info_span!("scan", id = %id.short()))
            .await
    }

    /// Run both pipelines over an already-expanded host list.
    pub async fn scan_hosts(&self, hosts: &[String]) -> ScanResult<Vec<HostRecord>> {
        self.scan_hosts_with_id(ScanId::new(), hosts).await
    }

    pub async fn scan_hosts_with_id(
        &self,
        id: ScanId,
        hosts: &[String],
    ) -> ScanResult<Vec<HostRecord>> {
        self.run(hosts)
            .instrument(info_span!("scan", id = %id.short()))
            .await
    }

    /// Stop accepting scans. Scans already running finish normally.
    pub fn close(&self) {
        self.scan_permits.close();
    }

    async fn scan_target(&self, target: &str) -> ScanResult<Vec<HostRecord>> {
        let spec = parse_target(target)?;
        let hosts = spec.hosts();
        info!(target = %spec, hosts = hosts.len(), "target expanded");
        self.run(&hosts).await
    }

    async fn run(&self, hosts: &[String]) -> ScanResult<Vec<HostRecord>> {
        let _permit = self
            .scan_permits
            .acquire()
            .await
            .map_err(|_| ScanError::Closed)?;
        let start = Instant::now();

        let (direct, intel) =
            futures::future::join(self.scan_parallel(hosts), self.intel_search(hosts)).await;

        let (direct_count, intel_count) = (direct.len(), intel.len());
        let merged = merge_results(direct, intel);

        info!(
            direct = direct_count,
            intel = intel_count,
            hosts = merged.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan complete"
        );
        Ok(merged)
    }

    /// Direct-probe pipeline: every host concurrently, bounded by
    /// `limits.hosts`. Hosts without findings are left out.
    async fn scan_parallel(&self, hosts: &[String]) -> Vec<HostRecord> {
        let (tx, mut rx) = mpsc::channel::<HostRecord>(hosts.len().max(1));
        let permits = Arc::new(Semaphore::new(self.limits.hosts.max(1)));
        let mut tasks = JoinSet::new();

        for host in hosts {
            let pipeline = self.pipeline.clone();
            let permits = Arc::clone(&permits);
            let tx = tx.clone();
            let host = host.clone();

            tasks.spawn(
                async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    if let Some(record) = pipeline.scan_host(&host).await {
                        let _ = tx.send(record).await;
                    }
                }
                .in_current_span(),
            );
        }
        drop(tx);

        let mut results = Vec::new();
        while let Some(record) = rx.recv().await {
            results.push(record);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "host task failed");
            }
        }

        results
    }

    /// Intelligence pipeline: hosts in order, one call at a time, with a
    /// pause of `limits.intel_interval` after each successful call.
    ///
    /// The first failed lookup ends the pipeline; records gathered so far
    /// are kept.
    async fn intel_search(&self, hosts: &[String]) -> Vec<HostRecord> {
        let Some(intel) = &self.intel else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut remaining = hosts.iter().peekable();

        while let Some(host) = remaining.next() {
            match intel.lookup(host).await {
                Ok(data) => results.push(HostRecord::from_intel(host.clone(), data)),
                Err(e) => {
                    warn!(
                        source = intel.name(),
                        host = %host,
                        error = %e,
                        "host intelligence lookup failed, skipping remaining hosts"
                    );
                    break;
                }
            }

            if remaining.peek().is_some() && !self.limits.intel_interval.is_zero() {
                tokio::time::sleep(self.limits.intel_interval).await;
            }
        }

        results
    }
}
