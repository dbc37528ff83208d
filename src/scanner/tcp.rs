//! TCP connect prober.
//!
//! Completes a full handshake through the operating system's socket API.
//! No special privileges are needed. Host names are resolved at connect
//! time, so an unresolvable name simply reports the port as unreachable.

use crate::scanner::traits::PortProber;
use crate::types::{Port, Protocol};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Default handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Connect-based TCP reachability check.
#[derive(Debug, Clone)]
pub struct TcpConnectProber {
    timeout: Duration,
}

impl TcpConnectProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Open a connection to `host:port`, bounded by the prober timeout.
    pub async fn connect(&self, host: &str, port: Port) -> io::Result<TcpStream> {
        match timeout(self.timeout, TcpStream::connect((host, port.as_u16()))).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
        }
    }
}

impl Default for TcpConnectProber {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl PortProber for TcpConnectProber {
    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }

    async fn probe(&self, host: &str, port: Port) -> bool {
        match self.connect(host, port).await {
            Ok(_) => true,
            Err(e) => {
                trace!(host, port = port.as_u16(), error = %e, "tcp probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_open_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        let prober = TcpConnectProber::new(Duration::from_secs(1));

        assert!(prober.probe("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        drop(listener);
        let prober = TcpConnectProber::new(Duration::from_millis(200));

        assert!(!prober.probe("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn test_unresolvable_name_fails_fast() {
        let prober = TcpConnectProber::new(Duration::from_millis(500));
        let port = Port::new(80).unwrap();
        assert!(!prober.probe("no-such-host.invalid", port).await);
    }

    #[test]
    fn test_prober_protocol() {
        let prober = TcpConnectProber::default();
        assert_eq!(prober.protocol(), Protocol::Tcp);
        assert_eq!(prober.timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
