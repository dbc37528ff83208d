//! UDP datagram prober.
//!
//! UDP has no handshake, so a port only counts as reachable when something
//! answers the probe payload.
//!
//! # Detection
//!
//! 1. **UDP response**: any datagram back means reachable
//! 2. **ICMP port unreachable**: surfaced as a socket error, not reachable
//! 3. **Silence**: not reachable (open|filtered ports are not reported)

use crate::scanner::traits::PortProber;
use crate::types::{Port, Protocol};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::trace;

/// Known UDP service probes for better detection.
struct UdpProbe {
    port: u16,
    payload: &'static [u8],
}

/// Common UDP service probes.
const UDP_PROBES: &[UdpProbe] = &[
    // DNS query for version.bind
    UdpProbe {
        port: 53,
        payload: b"\x00\x00\x10\x00\x00\x00\x00\x00\x00\x00\x00\x00",
    },
    // SNMP get-request
    UdpProbe {
        port: 161,
        payload: b"\x30\x26\x02\x01\x01\x04\x06public\xa0\x19\x02\x04",
    },
    // NTP version request
    UdpProbe {
        port: 123,
        payload: b"\xe3\x00\x04\xfa\x00\x01\x00\x00\x00\x01\x00\x00",
    },
    // TFTP read request
    UdpProbe {
        port: 69,
        payload: b"\x00\x01test\x00netascii\x00",
    },
    // NetBIOS name query
    UdpProbe {
        port: 137,
        payload: b"\x80\xf0\x00\x10\x00\x01\x00\x00\x00\x00\x00\x00\x20CKAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\x00\x00\x21\x00\x01",
    },
];

/// Default probe for unknown ports.
const DEFAULT_PROBE: &[u8] = b"\x00";

/// UDP reachability check.
#[derive(Debug, Clone)]
pub struct UdpProber {
    timeout: Duration,
    retries: u32,
}

impl UdpProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            retries: 2,
        }
    }

    /// Send the probe payload and wait for any answer.
    async fn exchange(&self, host: &str, port: Port) -> io::Result<bool> {
        let addr: SocketAddr = lookup_host((host, port.as_u16()))
            .await?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address"))?;

        let local: SocketAddr = if addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;

        let probe = get_probe_for_port(port.as_u16());
        let mut buf = [0u8; 1024];

        for attempt in 0..self.retries {
            socket.send(probe).await?;

            match timeout(self.timeout, socket.recv(&mut buf)).await {
                Ok(Ok(n)) if n > 0 => return Ok(true),
                // ICMP unreachable surfaces as a receive error on a connected socket
                Ok(Err(e)) => return Err(e),
                _ => {}
            }

            if attempt + 1 < self.retries {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        Ok(false)
    }
}

impl Default for UdpProber {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl PortProber for UdpProber {
    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }

    async fn probe(&self, host: &str, port: Port) -> bool {
        match self.exchange(host, port).await {
            Ok(answered) => answered,
            Err(e) => {
                trace!(host, port = port.as_u16(), error = %e, "udp probe failed");
                false
            }
        }
    }
}

/// Get the appropriate probe payload for a port.
fn get_probe_for_port(port: u16) -> &'static [u8] {
    UDP_PROBES
        .iter()
        .find(|p| p.port == port)
        .map(|p| p.payload)
        .unwrap_or(DEFAULT_PROBE)
}
