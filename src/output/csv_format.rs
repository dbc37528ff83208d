//! CSV output formatting.

use crate::report::ScanReport;
use std::io::{self, Write};

const HEADER: [&str; 9] = [
    "ip",
    "port",
    "protocol",
    "types",
    "os",
    "manufacturer",
    "device_type",
    "sensitive_info",
    "host_tags",
];

/// Write one row per port finding. List fields are `;`-joined.
pub fn write_csv<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(HEADER)?;

    for host in &report.hosts {
        let host_tags = host.tags.join(";");
        for finding in &host.ports {
            wtr.write_record([
                host.ip.as_str(),
                &finding.port.to_string(),
                finding.protocol.as_str(),
                &finding.types.join(";"),
                finding.os.as_deref().unwrap_or(""),
                finding.manufacturer.as_deref().unwrap_or(""),
                finding.device_type.as_deref().unwrap_or(""),
                &finding.sensitive_info.join(";"),
                &host_tags,
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HostRecord, Port, PortFinding, Protocol, ScanId};
    use chrono::Utc;

    #[test]
    fn test_one_row_per_finding() {
        let mut host = HostRecord::new("10.0.0.1");
        host.tags = vec!["http".into(), "ssh".into()];
        host.ports = vec![
            PortFinding::new(Port::new(22).unwrap(), Protocol::Tcp).with_type("ssh"),
            PortFinding::new(Port::new(80).unwrap(), Protocol::Tcp).with_type("http"),
        ];
        let report = ScanReport::new(ScanId::new(), "10.0.0.1", Utc::now(), vec![host]);

        let mut buf = Vec::new();
        write_csv(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ip,port,protocol"));
        assert_eq!(lines[1], "10.0.0.1,22,tcp,ssh,,,,,http;ssh");
    }
}
