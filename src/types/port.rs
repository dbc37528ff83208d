//! Port and transport protocol types.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535),
//! including when they arrive from configuration files or intelligence APIs.
//! `PortSpec` handles command-line overrides such as `22,80,8000-8010`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Transport protocol of a probe or finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(PortError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u16),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
    #[error("empty port specification")]
    Empty,
}

/// An ordered list of ports parsed from a compact specification.
///
/// Supports formats like `80`, `80,443,8080`, `1-1000` and `22,80,8000-9000`.
/// Order of first appearance is kept and repeats are dropped, so the result
/// can stand in for a configured port list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<Port>,
}

impl PortSpec {
    /// The ports in specification order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn into_ports(self) -> Vec<Port> {
        self.ports
    }

    fn push(&mut self, port: Port) {
        if !self.ports.contains(&port) {
            self.ports.push(port);
        }
    }
}

fn parse_port(s: &str) -> Result<Port, PortError> {
    let s = s.trim();
    let value: u16 = s
        .parse()
        .map_err(|_| PortError::InvalidFormat(s.to_string()))?;
    Port::try_from(value)
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut spec = Self::default();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_port(start)?;
                    let end = parse_port(end)?;
                    if start > end {
                        return Err(PortError::InvalidRange(start.0, end.0));
                    }
                    for p in start.0..=end.0 {
                        spec.push(Port(p));
                    }
                }
                None => spec.push(parse_port(part)?),
            }
        }

        if spec.ports.is_empty() {
            return Err(PortError::Empty);
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_port_rejects_zero_on_deserialize() {
        assert!(serde_json::from_str::<Port>("0").is_err());
        assert_eq!(serde_json::from_str::<Port>("443").unwrap().as_u16(), 443);
    }

    #[test]
    fn test_protocol_parse_and_display() {
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!(Protocol::Udp.to_string(), "udp");
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_port_spec_keeps_order() {
        let spec: PortSpec = "443,22,8000-8002".parse().unwrap();
        let raw: Vec<u16> = spec.ports().iter().map(|p| p.as_u16()).collect();
        assert_eq!(raw, vec![443, 22, 8000, 8001, 8002]);
    }

    #[test]
    fn test_port_spec_dedup() {
        let spec: PortSpec = "80,80,443,80".parse().unwrap();
        assert_eq!(spec.ports().len(), 2);
    }

    #[test]
    fn test_port_spec_errors() {
        assert!(matches!("".parse::<PortSpec>(), Err(PortError::Empty)));
        assert!(matches!(
            "100-50".parse::<PortSpec>(),
            Err(PortError::InvalidRange(100, 50))
        ));
        assert!(matches!("0".parse::<PortSpec>(), Err(PortError::OutOfRange(0))));
        assert!("http".parse::<PortSpec>().is_err());
    }
}
