//! Per-host direct-probe pipeline.
//!
//! For one address: optional geo enrichment, then one probe task per
//! configured TCP and UDP port under a per-host concurrency limit. Every
//! service observation from a reachable port is sent over a channel and
//! folded into the host's record by [`aggregate`].

use crate::scanner::traits::{GeoLookup, PortProber, ServiceDetector};
use crate::types::{HostRecord, Port, PortFinding, Protocol};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

/// Everything a host task needs, cheap to clone into spawned tasks.
#[derive(Clone)]
pub(crate) struct HostPipeline {
    pub tcp: Arc<dyn PortProber>,
    pub udp: Arc<dyn PortProber>,
    pub detector: Arc<dyn ServiceDetector>,
    pub geo: Option<Arc<dyn GeoLookup>>,
    pub tcp_ports: Arc<[Port]>,
    pub udp_ports: Arc<[Port]>,
    pub port_concurrency: usize,
}

impl HostPipeline {
    /// Scan one host. Returns `None` when no port produced a finding.
    pub async fn scan_host(&self, host: &str) -> Option<HostRecord> {
        let mut record = HostRecord::new(host);

        if let Some(geo) = &self.geo {
            match geo.lookup(host) {
                Ok(details) => record.apply_details(details),
                Err(e) => debug!(host, error = %e, "geo lookup unavailable"),
            }
        }

        let capacity = (self.tcp_ports.len() + self.udp_ports.len()).max(1);
        let (tx, mut rx) = mpsc::channel::<PortFinding>(capacity);
        let permits = Arc::new(Semaphore::new(self.port_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        let jobs = self
            .tcp_ports
            .iter()
            .map(|&port| (port, &self.tcp))
            .chain(self.udp_ports.iter().map(|&port| (port, &self.udp)));

        for (port, prober) in jobs {
            let prober = Arc::clone(prober);
            let detector = Arc::clone(&self.detector);
            let permits = Arc::clone(&permits);
            let tx = tx.clone();
            let host = host.to_string();

            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                probe_port(&host, port, prober.as_ref(), detector.as_ref(), &tx).await;
            });
        }
        drop(tx);

        let mut findings = Vec::new();
        while let Some(finding) = rx.recv().await {
            findings.push(finding);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(host, error = %e, "port task failed");
            }
        }

        aggregate(&mut record, findings);

        if record.ports.is_empty() {
            trace!(host, "no open ports, dropping host");
            return None;
        }

        debug!(host, ports = record.ports.len(), "host scan complete");
        Some(record)
    }
}

/// One scan job: probe, and on success forward every observation.
async fn probe_port(
    host: &str,
    port: Port,
    prober: &dyn PortProber,
    detector: &dyn ServiceDetector,
    tx: &mpsc::Sender<PortFinding>,
) {
    let protocol: Protocol = prober.protocol();
    if !prober.probe(host, port).await {
        return;
    }

    debug!(host, port = port.as_u16(), %protocol, "port reachable");
    for observation in detector.detect(host, port, protocol).await {
        if tx
            .send(PortFinding::observed(port, protocol, observation))
            .await
            .is_err()
        {
            return;
        }
    }
}

/// Fold port findings, in arrival order, into a host record.
///
/// - service types are unioned into the host tags
/// - manufacturer and device type take the last non-empty value seen
/// - OS is rewritten at the end as the `/`-joined distinct values seen,
///   replacing the last-seen value
/// - sensitive identifiers are deduplicated
/// - every finding is kept, even when its port number repeats
pub fn aggregate(record: &mut HostRecord, findings: impl IntoIterator<Item = PortFinding>) {
    let mut os_seen: Vec<String> = Vec::new();
    let mut sensitive: BTreeSet<String> = BTreeSet::new();

    for finding in findings {
        for tag in &finding.types {
            record.add_tag(tag.clone());
        }
        if let Some(os) = non_empty(&finding.os) {
            if !os_seen.iter().any(|seen| seen == os) {
                os_seen.push(os.to_string());
            }
            record.os = Some(os.to_string());
        }
        if let Some(manufacturer) = non_empty(&finding.manufacturer) {
            record.manufacturer = Some(manufacturer.to_string());
        }
        if let Some(device_type) = non_empty(&finding.device_type) {
            record.device_type = Some(device_type.to_string());
        }
        sensitive.extend(finding.sensitive_info.iter().cloned());

        record.ports.push(finding);
    }

    record.os = (!os_seen.is_empty()).then(|| os_seen.join("/"));
    record.sensitive_info = sensitive.into_iter().collect();
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
