//! Scan subcommand implementation.
//!
//! Handles the `trawl scan <target>` command.

use crate::cli::OutputFormat;
use crate::config::{AppSettings, Paths, PortConfig};
use crate::enrich::IntelCredentials;
use crate::error::CliResult;
use crate::output;
use crate::report::ScanReport;
use crate::scanner::Scanner;
use crate::types::{parse_target, resolve_domain, PortSpec, ScanId, TargetSpec};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Scan a target for open services.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan (IP, hostname, URL, or CIDR notation)
    ///
    /// Examples:
    ///   192.168.1.1             Single IP address
    ///   https://example.com/    URL (the host part is scanned)
    ///   192.168.1.0/24          CIDR range
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Port list file (YAML with tcp_ports / udp_ports)
    #[arg(short = 'c', long = "config", value_name = "PORTS.yaml")]
    pub ports_file: Option<PathBuf>,

    /// Override the TCP ports (e.g. "22,80,8000-8010")
    #[arg(long, value_name = "PORTS")]
    pub tcp_ports: Option<PortSpec>,

    /// Override the UDP ports (e.g. "53,161")
    #[arg(long, value_name = "PORTS")]
    pub udp_ports: Option<PortSpec>,

    /// Resolve a domain target and scan every address it maps to
    #[arg(long)]
    pub resolve: bool,

    /// Enrich hosts with geo/network details
    #[arg(long)]
    pub geo: bool,

    /// Geo database file (JSON prefix table); implies --geo
    #[arg(long, value_name = "PATH")]
    pub geo_db: Option<PathBuf>,

    /// Query the host-intelligence service
    #[arg(long)]
    pub intel: bool,

    /// Host-intelligence API id
    #[arg(long, env = "CENSYS_API_ID", hide_env_values = true)]
    pub api_id: Option<String>,

    /// Host-intelligence API secret
    #[arg(long, env = "CENSYS_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Probe timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, paths: &Paths, quiet: bool) -> CliResult<()> {
        let settings = self.settings(AppSettings::load(paths)?);
        let ports = self.port_config(&settings, paths)?;
        let credentials = IntelCredentials::new(self.api_id.clone(), self.api_secret.clone());

        let has_credentials = credentials.is_some();
        let scanner = Scanner::from_settings(&settings, &ports, credentials);

        if !quiet {
            for warning in stage_warnings(&settings, &scanner, has_credentials) {
                output::print_warning(warning);
            }
        }

        let spec = parse_target(&self.target)?;
        let resolved = match (&spec, self.resolve) {
            (TargetSpec::Name(name), true) => {
                let addrs = resolve_domain(name).await?;
                info!(domain = %name, addresses = addrs.len(), "domain resolved");
                Some(addrs.iter().map(|a| a.to_string()).collect::<Vec<_>>())
            }
            _ => None,
        };
        let host_count = resolved
            .as_ref()
            .map_or_else(|| spec.host_count(), |hosts| hosts.len() as u128);

        let interactive = !quiet && self.output == OutputFormat::Plain;
        if interactive {
            output::print_scan_header(&self.target, host_count, ports.probe_count());
        }
        let spinner = interactive.then(|| spinner(&self.target));

        let id = ScanId::new();
        let started_at = Utc::now();
        let result = match &resolved {
            Some(hosts) => scanner.scan_hosts_with_id(id, hosts).await,
            None => scanner.scan_with_id(id, &self.target).await,
        };
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let report = ScanReport::new(id, &self.target, started_at, result?);
        output::format_report(&report, self.output)?;

        Ok(())
    }

    /// Stored settings with this invocation's overrides applied.
    fn settings(&self, mut settings: AppSettings) -> AppSettings {
        if let Some(path) = &self.geo_db {
            settings.geo_database = Some(path.clone());
            settings.enable_geo = true;
        }
        if self.geo {
            settings.enable_geo = true;
        }
        if self.intel {
            settings.enable_intel = true;
        }
        if let Some(timeout) = self.timeout {
            settings.probe_timeout_ms = timeout;
        }
        if let Some(path) = &self.ports_file {
            settings.ports_file = Some(path.clone());
        }
        settings
    }

    fn port_config(&self, settings: &AppSettings, paths: &Paths) -> CliResult<PortConfig> {
        let mut ports = settings.port_config(paths)?;
        if let Some(spec) = &self.tcp_ports {
            ports.tcp_ports = spec.ports().to_vec();
        }
        if let Some(spec) = &self.udp_ports {
            ports.udp_ports = spec.ports().to_vec();
        }
        Ok(ports)
    }
}

/// Requested enrichment stages the scanner ended up running without.
fn stage_warnings(
    settings: &AppSettings,
    scanner: &Scanner,
    has_credentials: bool,
) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if settings.enable_geo && !scanner.geo_enabled() {
        warnings.push("IP information lookup disabled: geo database missing or unreadable (--geo-db)");
    }
    if settings.enable_intel && !scanner.intel_enabled() {
        warnings.push(if has_credentials {
            "host intelligence disabled: HTTP client could not be built"
        } else {
            "host intelligence needs --api-id and --api-secret (or CENSYS_API_ID / CENSYS_API_SECRET)"
        });
    }
    warnings
}

fn spinner(target: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.set_message(format!("Scanning {}", target));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ScanCommand {
        let mut argv = vec!["scan"];
        argv.extend_from_slice(args);
        ScanCommand::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flag_overrides() {
        let cmd = parse(&["10.0.0.1", "--geo-db", "/tmp/geo.json", "--intel", "-t", "500"]);
        let settings = cmd.settings(AppSettings::default());
        assert!(settings.enable_geo);
        assert!(settings.enable_intel);
        assert_eq!(settings.geo_database, Some(PathBuf::from("/tmp/geo.json")));
        assert_eq!(settings.probe_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_stored_settings_kept_without_flags() {
        let stored = AppSettings {
            enable_geo: true,
            ..AppSettings::default()
        };
        let settings = parse(&["10.0.0.1"]).settings(stored.clone());
        assert_eq!(settings, stored);
    }

    #[test]
    fn test_port_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_root(dir.path());
        let cmd = parse(&["10.0.0.1", "--tcp-ports", "22,80", "--udp-ports", "53"]);
        let ports = cmd.port_config(&AppSettings::default(), &paths).unwrap();
        assert_eq!(ports.tcp_ports.len(), 2);
        assert_eq!(ports.udp_ports.len(), 1);
    }

    #[test]
    fn test_missing_stages_are_reported() {
        let settings = parse(&["10.0.0.1", "--geo-db", "/nonexistent/geo.json", "--intel"])
            .settings(AppSettings::default());
        let scanner = Scanner::from_settings(&settings, &PortConfig::default(), None);

        let warnings = stage_warnings(&settings, &scanner, false);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("--geo-db"));
        assert!(warnings[1].contains("--api-id"));
    }

    #[test]
    fn test_no_warnings_when_stages_not_requested() {
        let settings = AppSettings::default();
        let scanner = Scanner::from_settings(&settings, &PortConfig::default(), None);
        assert!(stage_warnings(&settings, &scanner, false).is_empty());
    }
}
