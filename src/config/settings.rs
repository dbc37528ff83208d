//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration files.

use super::PortConfig;
use crate::enrich::CensysClient;
use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/trawl)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve the XDG configuration directory.
    pub fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "trawl", "trawl").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Paths rooted at an explicit directory.
    pub fn with_root(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the path to the default port file.
    pub fn ports_file(&self) -> PathBuf {
        self.config_dir.join("ports.yaml")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Port list file; `<config_dir>/ports.yaml` or the built-in list if unset.
    pub ports_file: Option<PathBuf>,
    /// Enrich discovered hosts with geo/network details.
    pub enable_geo: bool,
    /// JSON prefix database used for geo enrichment.
    pub geo_database: Option<PathBuf>,
    /// Query the host-intelligence service.
    pub enable_intel: bool,
    /// Root URL of the host-intelligence API.
    pub intel_api_url: String,
    /// Probe and request timeout in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ports_file: None,
            enable_geo: false,
            geo_database: None,
            enable_intel: false,
            intel_api_url: CensysClient::DEFAULT_API_URL.to_string(),
            probe_timeout_ms: 3000,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if there is no file.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to the default location.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        self.save_to(&paths.settings_file())
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.max(1))
    }

    /// Load the effective port configuration.
    ///
    /// An explicit `ports_file` must exist; the default location is optional.
    pub fn port_config(&self, paths: &Paths) -> ConfigResult<PortConfig> {
        if let Some(file) = &self.ports_file {
            return PortConfig::load(file);
        }

        let file = paths.ports_file();
        if file.exists() {
            PortConfig::load(&file)
        } else {
            Ok(PortConfig::default())
        }
    }
}
