//! Collaborator contracts consumed by the orchestrator.
//!
//! Each stage of a scan is reached through one of these traits so the
//! orchestrator can be driven by real network adapters or by in-process
//! fakes in tests.

use crate::error::AdapterResult;
use crate::types::{IntelData, IpDetails, Port, Protocol, ServiceObservation};
use async_trait::async_trait;

/// Reachability check for one transport protocol.
///
/// Implementations are expected to enforce their own timeouts; the
/// orchestrator waits for every probe it starts.
#[async_trait]
pub trait PortProber: Send + Sync {
    /// Protocol this prober speaks.
    fn protocol(&self) -> Protocol;

    /// Whether `host:port` answered.
    async fn probe(&self, host: &str, port: Port) -> bool;
}

/// Turns a reachable port into zero or more service observations.
#[async_trait]
pub trait ServiceDetector: Send + Sync {
    async fn detect(&self, host: &str, port: Port, protocol: Protocol) -> Vec<ServiceObservation>;
}

/// Geolocation and network-ownership lookup.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, host: &str) -> AdapterResult<IpDetails>;
}

/// Third-party host intelligence.
///
/// Treated as rate limited: the orchestrator never calls it from more than
/// one task at a time.
#[async_trait]
pub trait HostIntel: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    async fn lookup(&self, host: &str) -> AdapterResult<IntelData>;
}
