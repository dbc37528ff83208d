//! Resolve subcommand implementation.

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::types::resolve_domain;
use clap::Parser;
use std::io::{self, Write};
use std::net::IpAddr;

/// Resolve a domain name to its IPv4 and IPv6 addresses.
#[derive(Parser, Debug)]
pub struct ResolveCommand {
    /// Domain name to resolve
    #[arg(value_name = "DOMAIN")]
    pub domain: String,

    /// Output format (csv prints one address per line)
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl ResolveCommand {
    pub async fn execute(&self) -> CliResult<()> {
        let addrs = resolve_domain(&self.domain).await?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_addresses(&mut out, &self.domain, &addrs, self.output)?;
        Ok(())
    }
}

fn write_addresses<W: Write>(
    out: &mut W,
    domain: &str,
    addrs: &[IpAddr],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "domain": domain, "addresses": addrs });
            serde_json::to_writer_pretty(&mut *out, &value)?;
            writeln!(out)
        }
        OutputFormat::Plain | OutputFormat::Csv => {
            for addr in addrs {
                writeln!(out, "{}", addr)?;
            }
            Ok(())
        }
    }
}
