//! Fusion of direct-probe and intelligence results.

use crate::types::HostRecord;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Merge two per-host result sets into one inventory.
///
/// Direct records are the base. An intelligence record for a new address is
/// inserted whole; for a known address only its ports and tags are folded
/// in. A port joins only if no finding with that port number exists yet
/// (protocol is ignored), and a tag joins only if it is not already there.
///
/// Output order is unspecified.
pub fn merge_results(direct: Vec<HostRecord>, intel: Vec<HostRecord>) -> Vec<HostRecord> {
    let mut hosts: HashMap<String, HostRecord> = direct
        .into_iter()
        .map(|record| (record.ip.clone(), record))
        .collect();

    for record in intel {
        match hosts.entry(record.ip.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                for finding in record.ports {
                    if !existing.has_port(finding.port) {
                        existing.ports.push(finding);
                    }
                }
                for tag in record.tags {
                    existing.add_tag(tag);
                }
            }
        }
    }

    hosts.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Port, PortFinding, Protocol};

    fn host(ip: &str, ports: &[(u16, Protocol, &str)], tags: &[&str]) -> HostRecord {
        let mut record = HostRecord::new(ip);
        for &(port, protocol, tag) in ports {
            record
                .ports
                .push(PortFinding::new(Port::new(port).unwrap(), protocol).with_type(tag));
        }
        record.tags = tags.iter().map(|t| t.to_string()).collect();
        record
    }

    fn by_ip(records: Vec<HostRecord>) -> HashMap<String, HostRecord> {
        records.into_iter().map(|r| (r.ip.clone(), r)).collect()
    }

    #[test]
    fn test_direct_wins_port_collision() {
        let direct = vec![host("10.0.0.1", &[(80, Protocol::Tcp, "http")], &["http"])];
        let intel = vec![host(
            "10.0.0.1",
            &[(80, Protocol::Tcp, "nginx"), (443, Protocol::Tcp, "https")],
            &["http", "cdn"],
        )];

        let merged = merge_results(direct, intel);
        assert_eq!(merged.len(), 1);
        let record = &merged[0];

        let ports: Vec<(u16, &str)> = record
            .ports
            .iter()
            .map(|p| (p.port.as_u16(), p.types[0].as_str()))
            .collect();
        assert_eq!(ports, vec![(80, "http"), (443, "https")]);
        assert_eq!(record.tags, vec!["http", "cdn"]);
    }

    #[test]
    fn test_protocol_ignored_for_collision() {
        let direct = vec![host("10.0.0.1", &[(53, Protocol::Tcp, "dns")], &[])];
        let intel = vec![host("10.0.0.1", &[(53, Protocol::Udp, "dns")], &[])];

        let merged = merge_results(direct, intel);
        assert_eq!(merged[0].ports.len(), 1);
        assert_eq!(merged[0].ports[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn test_new_addresses_inserted() {
        let direct = vec![host("10.0.0.1", &[(22, Protocol::Tcp, "ssh")], &["ssh"])];
        let intel = vec![host("10.0.0.9", &[(25, Protocol::Tcp, "smtp")], &["smtp"])];

        let merged = by_ip(merge_results(direct, intel));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["10.0.0.9"].tags, vec!["smtp"]);
    }

    #[test]
    fn test_intra_host_duplicates_survive() {
        let direct = vec![host(
            "10.0.0.1",
            &[(80, Protocol::Tcp, "http"), (80, Protocol::Tcp, "apache")],
            &[],
        )];
        let merged = merge_results(direct, vec![]);
        assert_eq!(merged[0].ports.len(), 2);
    }

    #[test]
    fn test_intel_only_metadata_not_copied_onto_direct() {
        let direct = vec![host("10.0.0.1", &[(80, Protocol::Tcp, "http")], &[])];
        let mut intel = host("10.0.0.1", &[], &[]);
        intel.os = Some("Windows".into());

        let merged = merge_results(direct, vec![intel]);
        assert_eq!(merged[0].os, None);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge_results(vec![], vec![]).is_empty());
    }
}
