//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `trawl scan <target>` - Scan a target and print its inventory
//! - `trawl resolve <domain>` - Resolve a domain to its addresses
//! - `trawl config show|init` - Inspect or create configuration files

mod config;
mod resolve;
mod scan;

pub use config::{ConfigAction, ConfigCommand};
pub use resolve::ResolveCommand;
pub use scan::ScanCommand;

use clap::{Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

/// trawl - concurrent network reconnaissance.
///
/// Probes every address of a target directly and, optionally, asks a
/// host-intelligence service about the same addresses, then merges both
/// views into one inventory.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent network reconnaissance", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration directory (defaults to the XDG config directory)
    #[arg(long, global = true, value_name = "DIR", env = "TRAWL_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a target for open services
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Resolve a domain name to IP addresses
    #[command(alias = "r")]
    Resolve(ResolveCommand),

    /// Show or initialize configuration
    Config(ConfigCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from([
            "trawl", "-v", "scan", "10.0.0.0/30", "--intel", "--api-id", "id", "--api-secret",
            "secret", "-o", "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Scan(scan) => {
                assert_eq!(scan.target, "10.0.0.0/30");
                assert!(scan.intel);
                assert_eq!(scan.output, OutputFormat::Json);
                assert_eq!(scan.api_id.as_deref(), Some("id"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_port_overrides() {
        let cli =
            Cli::try_parse_from(["trawl", "scan", "example.com", "--tcp-ports", "22,80,8000-8002"])
                .unwrap();
        let Commands::Scan(scan) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(scan.tcp_ports.unwrap().ports().len(), 5);
        assert!(Cli::try_parse_from(["trawl", "scan", "x", "--tcp-ports", "0"]).is_err());
    }

    #[test]
    fn test_parse_config_actions() {
        let cli = Cli::try_parse_from(["trawl", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand {
                action: ConfigAction::Init { force: true }
            })
        ));
    }
}
