//! Scan reports.
//!
//! A [`ScanReport`] wraps one scan's inventory with its id and timing for
//! presentation. Reports are not persisted.

use crate::types::{HostRecord, ScanId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::net::IpAddr;

/// One finished scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Unique identifier for this scan.
    pub id: ScanId,
    /// Target as given by the user.
    pub target: String,
    /// When the scan was started.
    pub started_at: DateTime<Utc>,
    /// When the scan completed.
    pub completed_at: DateTime<Utc>,
    /// Total scan duration in milliseconds.
    pub duration_ms: u64,
    /// Hosts sorted by address.
    pub hosts: Vec<HostRecord>,
}

impl ScanReport {
    /// Finalize a report for a scan that started at `started_at`.
    pub fn new(
        id: ScanId,
        target: impl Into<String>,
        started_at: DateTime<Utc>,
        mut hosts: Vec<HostRecord>,
    ) -> Self {
        let completed_at = Utc::now();
        let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;
        hosts.sort_by(|a, b| compare_hosts(&a.ip, &b.ip));

        Self {
            id,
            target: target.into(),
            started_at,
            completed_at,
            duration_ms,
            hosts,
        }
    }

    pub fn port_count(&self) -> usize {
        self.hosts.iter().map(|h| h.ports.len()).sum()
    }

    /// One-line summary of the scan.
    pub fn summary(&self) -> String {
        format!(
            "{} - {} hosts, {} open ports [{:.2}s]",
            self.target,
            self.hosts.len(),
            self.port_count(),
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// Numeric address order; IPv4 before IPv6, non-addresses last.
fn compare_hosts(a: &str, b: &str) -> Ordering {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
