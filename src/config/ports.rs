//! Port lists probed by the direct pipeline.
//!
//! ```yaml
//! tcp_ports: [22, 80, 443]
//! udp_ports: [53, 161]
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::types::Port;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_TCP_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 554, 993, 995, 1433, 1521, 1723,
    1883, 2375, 3306, 3389, 5060, 5432, 5900, 6379, 8000, 8080, 8443, 8888, 9200, 27017,
];

const DEFAULT_UDP_PORTS: &[u16] = &[53, 69, 123, 137, 161, 500, 1900, 5353];

/// TCP and UDP ports to probe on every host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    #[serde(default)]
    pub tcp_ports: Vec<Port>,
    #[serde(default)]
    pub udp_ports: Vec<Port>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            tcp_ports: DEFAULT_TCP_PORTS.iter().filter_map(|&p| Port::new(p)).collect(),
            udp_ports: DEFAULT_UDP_PORTS.iter().filter_map(|&p| Port::new(p)).collect(),
        }
    }
}

impl PortConfig {
    /// Load a port file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a port document. Port 0 and out-of-range values are rejected.
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the port file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_yaml()?).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn probe_count(&self) -> usize {
        self.tcp_ports.len() + self.udp_ports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let config = PortConfig::from_yaml("tcp_ports: [22, 80]\nudp_ports: [161]\n").unwrap();
        let tcp: Vec<u16> = config.tcp_ports.iter().map(|p| p.as_u16()).collect();
        assert_eq!(tcp, vec![22, 80]);
        assert_eq!(config.udp_ports.len(), 1);
        assert_eq!(config.probe_count(), 3);
    }

    #[test]
    fn test_missing_list_is_empty() {
        let config = PortConfig::from_yaml("tcp_ports: [443]\n").unwrap();
        assert!(config.udp_ports.is_empty());
    }

    #[test]
    fn test_zero_port_rejected() {
        assert!(matches!(
            PortConfig::from_yaml("tcp_ports: [0, 80]\n"),
            Err(ConfigError::InvalidFormat(_))
        ));
        assert!(matches!(
            PortConfig::from_yaml("udp_ports: [70000]\n"),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_default_lists() {
        let config = PortConfig::default();
        assert!(config.tcp_ports.contains(&Port::new(22).unwrap()));
        assert!(config.udp_ports.contains(&Port::new(161).unwrap()));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ports.yaml");

        let config = PortConfig::default();
        config.save(&path).unwrap();
        assert_eq!(PortConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PortConfig::load(Path::new("/nonexistent/ports.yaml")),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
