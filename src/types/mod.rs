//! Core type definitions.
//!
//! Newtypes keep ports valid, `TargetSpec` captures what a raw target string
//! normalizes to, and the host types describe an inventory.

mod host;
mod port;
mod scan_id;
mod target;

pub use host::{
    GeoDetails, HostRecord, IntelData, IpDetails, PortFinding, RiskFlags, ServiceObservation,
};
pub use port::{Port, PortError, PortSpec, Protocol};
pub use scan_id::ScanId;
pub use target::{expand_cidr, parse_target, resolve_domain, TargetError, TargetSpec};
