//! Target normalization, CIDR expansion and domain resolution.
//!
//! A raw target is one of:
//! - A URL (`https://example.com:8443/path`), reduced to its host
//! - A block in CIDR notation (`192.168.1.0/24`, `2001:db8::/120`)
//! - A literal IP address (`10.0.0.5`, `::1`)
//! - Anything else, kept verbatim as a host name

use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;
use tracing::info;
use trust_dns_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::TokioAsyncResolver;
use url::Url;

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid URL '{0}': {1}")]
    InvalidUrl(String, String),
    #[error("URL '{0}' has no host")]
    MissingHost(String),
    #[error("block {0} is too large: {1} addresses (max: {2})")]
    BlockTooLarge(String, u128, u128),
    #[error("failed to resolve '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for domain '{0}'")]
    NoAddressesFound(String),
}

/// A normalized scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A literal IP address.
    Address(IpAddr),
    /// Block notation. Kept as text: a block that does not parse is scanned
    /// as a single literal host instead of failing the scan.
    Block(String),
    /// A host name, scanned as-is unless the caller resolves it first.
    Name(String),
}

impl TargetSpec {
    /// Largest block accepted by [`parse_target`]: an IPv4 /8.
    pub const MAX_BLOCK_HOSTS: u128 = 1 << 24;

    /// Expand into the host list fed to the pipelines.
    pub fn hosts(&self) -> Vec<String> {
        match self {
            Self::Address(ip) => vec![ip.to_string()],
            Self::Block(block) => expand_cidr(block),
            Self::Name(name) => vec![name.clone()],
        }
    }

    /// Number of hosts [`hosts`](Self::hosts) yields, without expanding.
    pub fn host_count(&self) -> u128 {
        match self {
            Self::Block(block) => match block.parse::<IpNetwork>() {
                Ok(network) => match block_size(&network) {
                    size if size > 2 => size - 2,
                    size => size,
                },
                Err(_) => 1,
            },
            _ => 1,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(ip) => write!(f, "{}", ip),
            Self::Block(block) => f.write_str(block),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Normalize a user-supplied target.
///
/// A malformed `http://` or `https://` target is an error. So is a block
/// wider than [`TargetSpec::MAX_BLOCK_HOSTS`] (an IPv4 prefix shorter than
/// /8, or an IPv6 prefix shorter than /104), since its host list could not
/// be held in memory. Every other string resolves to something scannable.
pub fn parse_target(raw: &str) -> Result<TargetSpec, TargetError> {
    info!(target = raw, "processing target");
    let mut target = raw.trim().to_string();

    if target.starts_with("http://") || target.starts_with("https://") {
        let url = Url::parse(&target)
            .map_err(|e| TargetError::InvalidUrl(target.clone(), e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| TargetError::MissingHost(target.clone()))?;
        // IPv6 hosts come back bracketed; the port is never part of host_str
        target = host.trim_start_matches('[').trim_end_matches(']').to_string();
        info!(host = %target, "extracted host from URL");
    }

    if target.contains('/') {
        info!("detected CIDR format");
        if let Ok(network) = target.parse::<IpNetwork>() {
            let size = block_size(&network);
            if size > TargetSpec::MAX_BLOCK_HOSTS {
                return Err(TargetError::BlockTooLarge(
                    target,
                    size,
                    TargetSpec::MAX_BLOCK_HOSTS,
                ));
            }
        }
        return Ok(TargetSpec::Block(target));
    }

    if let Ok(ip) = target.parse::<IpAddr>() {
        info!("detected IP address format");
        return Ok(TargetSpec::Address(ip));
    }

    Ok(TargetSpec::Name(target))
}

fn block_size(network: &IpNetwork) -> u128 {
    let host_bits = match network {
        IpNetwork::V4(net) => 32 - u32::from(net.prefix()),
        IpNetwork::V6(net) => 128 - u32::from(net.prefix()),
    };
    1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
}

/// Enumerate every address of a block in ascending order.
///
/// Bare addresses and unparseable blocks come back as a single element.
/// When the block holds more than two addresses the network and broadcast
/// addresses are dropped, so a /31 (or /127) keeps both of its members.
pub fn expand_cidr(cidr: &str) -> Vec<String> {
    if !cidr.contains('/') {
        return vec![cidr.to_string()];
    }

    let network: IpNetwork = match cidr.parse() {
        Ok(network) => network,
        Err(_) => return vec![cidr.to_string()],
    };

    let mut ips: Vec<String> = network.iter().map(|ip| ip.to_string()).collect();

    if ips.len() > 2 {
        ips.pop();
        ips.remove(0);
    }

    ips
}

/// Resolve a domain to the union of its A and AAAA records.
///
/// Each address appears once, IPv4 before IPv6.
pub async fn resolve_domain(domain: &str) -> Result<Vec<IpAddr>, TargetError> {
    let mut opts = ResolverOpts::default();
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);

    let response = resolver.lookup_ip(domain).await.map_err(|e| match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => TargetError::NoAddressesFound(domain.to_string()),
        _ => TargetError::DnsResolutionFailed(domain.to_string(), e.to_string()),
    })?;

    let mut ips: Vec<IpAddr> = Vec::new();
    for ip in response.iter() {
        if !ips.contains(&ip) {
            ips.push(ip);
        }
    }
    ips.sort_by_key(|ip| ip.is_ipv6());

    if ips.is_empty() {
        return Err(TargetError::NoAddressesFound(domain.to_string()));
    }

    Ok(ips)
}
