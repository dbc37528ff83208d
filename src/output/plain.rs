//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::report::ScanReport;
use crate::types::{GeoDetails, HostRecord};
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Write a report in human-readable plain text format.
pub fn write_plain<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                    {} Scan Results", style("trawl").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Target:").bold(), report.target)?;
    writeln!(out, "  {} {}", style("Scan ID:").bold(), style(report.id.short()).dim())?;
    writeln!(
        out,
        "  {} {} hosts, {} open ports in {:.2}s",
        style("Statistics:").bold(),
        style(report.hosts.len()).green().bold(),
        style(report.port_count()).green().bold(),
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(out)?;

    if report.hosts.is_empty() {
        writeln!(out, "  {}", style("No hosts with open ports.").dim())?;
    }

    for host in &report.hosts {
        write_host(out, host)?;
    }

    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

fn write_host<W: Write>(out: &mut W, host: &HostRecord) -> io::Result<()> {
    writeln!(out, "  {}", style(&host.ip).white().bold())?;

    if !host.tags.is_empty() {
        writeln!(out, "    {} {}", style("tags:").dim(), host.tags.join(", "))?;
    }
    for (label, value) in [
        ("os:", &host.os),
        ("manufacturer:", &host.manufacturer),
        ("device:", &host.device_type),
    ] {
        if let Some(value) = value {
            writeln!(out, "    {} {}", style(label).dim(), value)?;
        }
    }
    if let Some(geo) = &host.geo {
        if let Some(location) = describe_location(geo) {
            writeln!(out, "    {} {}", style("location:").dim(), location)?;
        }
    }
    if !host.sensitive_info.is_empty() {
        writeln!(
            out,
            "    {} {}",
            style("sensitive:").red().bold(),
            host.sensitive_info.join(", ")
        )?;
    }

    writeln!(out, "    {}", style(THIN_RULE).dim())?;
    writeln!(
        out,
        "    {:>6}  {:<5}  {}",
        style("PORT").bold(),
        style("PROTO").bold(),
        style("SERVICE").bold()
    )?;
    for finding in &host.ports {
        let service = if finding.types.is_empty() {
            "unknown".to_string()
        } else {
            finding.types.join(", ")
        };
        writeln!(
            out,
            "    {:>6}  {:<5}  {}",
            finding.port.as_u16(),
            finding.protocol.as_str(),
            truncate_string(&service, 45)
        )?;
    }
    writeln!(out)?;

    Ok(())
}

/// "City, Country (AS123 Org)" from whatever parts are present.
fn describe_location(geo: &GeoDetails) -> Option<String> {
    let place: Vec<&str> = [&geo.city, &geo.region, &geo.country]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .collect();

    let mut text = place.join(", ");
    if let Some(asn) = geo.asn {
        let org = geo.asn_org.as_deref().unwrap_or("");
        let network = format!("AS{} {}", asn, org);
        let network = network.trim_end();
        if text.is_empty() {
            text = network.to_string();
        } else {
            text = format!("{} ({})", text, network);
        }
    }

    (!text.is_empty()).then_some(text)
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, hosts: u128, probes_per_host: usize) {
    eprintln!();
    eprintln!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("trawl").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{} Target: {}", style("•").dim(), style(target).white().bold());
    eprintln!(
        "{} {} hosts, {} probes per host",
        style("•").dim(),
        style(hosts).white().bold(),
        probes_per_host
    );
    eprintln!();
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Port, PortFinding, Protocol, ScanId};
    use chrono::Utc;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_describe_location() {
        let geo = GeoDetails {
            city: Some("Amsterdam".into()),
            country: Some("Netherlands".into()),
            asn: Some(64500),
            asn_org: Some("EXAMPLE".into()),
            ..GeoDetails::default()
        };
        assert_eq!(
            describe_location(&geo).as_deref(),
            Some("Amsterdam, Netherlands (AS64500 EXAMPLE)")
        );
        assert!(describe_location(&GeoDetails::default()).is_none());
    }

    #[test]
    fn test_plain_lists_hosts_and_ports() {
        console::set_colors_enabled(false);
        let mut host = HostRecord::new("10.0.0.1");
        host.tags.push("http".into());
        host.ports
            .push(PortFinding::new(Port::new(80).unwrap(), Protocol::Tcp).with_type("http"));
        let report = ScanReport::new(ScanId::new(), "10.0.0.0/30", Utc::now(), vec![host]);

        let mut buf = Vec::new();
        write_plain(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("10.0.0.0/30"));
        assert!(text.contains("10.0.0.1"));
        assert!(text.contains("    80  tcp    http"));
    }
}
