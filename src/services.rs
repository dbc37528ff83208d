//! Well-known service names by port and protocol.

use crate::types::Protocol;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Ports whose service depends on the transport.
const UDP_ONLY: &[(u16, &str)] = &[
    (53, "dns"),
    (67, "dhcp-server"),
    (68, "dhcp-client"),
    (69, "tftp"),
    (123, "ntp"),
    (137, "netbios-ns"),
    (138, "netbios-dgm"),
    (161, "snmp"),
    (162, "snmptrap"),
    (500, "isakmp"),
    (514, "syslog"),
    (520, "rip"),
    (1194, "openvpn"),
    (1701, "l2tp"),
    (1812, "radius"),
    (1813, "radius-acct"),
    (1900, "ssdp"),
    (4500, "ipsec-nat-t"),
    (5353, "mdns"),
    (11211, "memcached"),
];

const TCP_OR_ANY: &[(u16, &str)] = &[
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (53, "dns"),
    (80, "http"),
    (88, "kerberos"),
    (110, "pop3"),
    (111, "rpcbind"),
    (119, "nntp"),
    (135, "msrpc"),
    (139, "netbios-ssn"),
    (143, "imap"),
    (179, "bgp"),
    (389, "ldap"),
    (443, "https"),
    (445, "microsoft-ds"),
    (465, "smtps"),
    (513, "rlogin"),
    (515, "printer"),
    (548, "afp"),
    (554, "rtsp"),
    (587, "submission"),
    (631, "ipp"),
    (636, "ldaps"),
    (873, "rsync"),
    (902, "vmware-auth"),
    (993, "imaps"),
    (995, "pop3s"),
    (1080, "socks"),
    (1433, "mssql"),
    (1521, "oracle"),
    (1723, "pptp"),
    (1883, "mqtt"),
    (2049, "nfs"),
    (2082, "cpanel"),
    (2181, "zookeeper"),
    (2375, "docker"),
    (2376, "docker-ssl"),
    (3000, "grafana"),
    (3128, "squid"),
    (3306, "mysql"),
    (3389, "rdp"),
    (3690, "svn"),
    (4369, "epmd"),
    (5000, "upnp"),
    (5060, "sip"),
    (5222, "xmpp-client"),
    (5432, "postgresql"),
    (5672, "amqp"),
    (5900, "vnc"),
    (5984, "couchdb"),
    (6379, "redis"),
    (6443, "kubernetes-api"),
    (6667, "irc"),
    (7001, "weblogic"),
    (8000, "http-alt"),
    (8008, "http-alt"),
    (8080, "http-proxy"),
    (8081, "http-alt"),
    (8443, "https-alt"),
    (8888, "http-alt"),
    (9000, "cslistener"),
    (9042, "cassandra"),
    (9090, "prometheus"),
    (9092, "kafka"),
    (9200, "elasticsearch"),
    (9418, "git"),
    (10000, "webmin"),
    (11211, "memcached"),
    (15672, "rabbitmq-mgmt"),
    (27017, "mongodb"),
    (50070, "hdfs-namenode"),
];

static UDP_SERVICES: LazyLock<HashMap<u16, &'static str>> =
    LazyLock::new(|| UDP_ONLY.iter().copied().collect());

static TCP_SERVICES: LazyLock<HashMap<u16, &'static str>> =
    LazyLock::new(|| TCP_OR_ANY.iter().copied().collect());

/// Probable service on `port` for the given transport, if well known.
pub fn service_name(port: u16, protocol: Protocol) -> Option<&'static str> {
    match protocol {
        Protocol::Udp => UDP_SERVICES
            .get(&port)
            .or_else(|| TCP_SERVICES.get(&port))
            .copied(),
        Protocol::Tcp => TCP_SERVICES.get(&port).copied(),
    }
}

/// Service name, or `"unknown"` for unrecognized ports.
pub fn service_tag(port: u16, protocol: Protocol) -> &'static str {
    service_name(port, protocol).unwrap_or("unknown")
}
