//! Banner grabbing for TCP services.
//!
//! Reads whatever a service sends right after the handshake; web ports get
//! a `HEAD` request first if they stay quiet.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Maximum bytes to read for a banner.
const MAX_BANNER_SIZE: usize = 1024;

/// Longest banner kept after sanitizing.
const MAX_BANNER_CHARS: usize = 512;

/// Probe sent to quiet web ports.
const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Read a banner from a freshly connected stream.
///
/// Returns `None` if the service sent nothing printable in time.
pub async fn grab_banner(mut stream: TcpStream, port: u16, wait: Duration) -> Option<String> {
    let mut buffer = vec![0u8; MAX_BANNER_SIZE];

    if let Ok(Ok(n)) = timeout(wait, stream.read(&mut buffer)).await {
        if n > 0 {
            return non_empty(sanitize_banner(&buffer[..n]));
        }
    }

    if !is_http_port(port) || stream.write_all(HTTP_PROBE).await.is_err() {
        return None;
    }

    match timeout(wait, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => non_empty(sanitize_banner(&buffer[..n])),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Check if a port is commonly used for HTTP services.
pub fn is_http_port(port: u16) -> bool {
    matches!(
        port,
        80 | 443 | 8000 | 8008 | 8080 | 8081 | 8082 | 8083 | 8443 | 8888 | 9000 | 9090
    )
}

/// Replace control bytes, collapse whitespace and cap the length.
pub fn sanitize_banner(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len().min(MAX_BANNER_CHARS));
    let mut prev_space = false;

    for &b in data.iter().take(MAX_BANNER_CHARS) {
        let c = match b {
            b'\r' | b'\n' | b'\t' | b' ' => ' ',
            b if b.is_ascii_graphic() => b as char,
            _ => '.',
        };
        if c == ' ' && prev_space {
            continue;
        }
        prev_space = c == ' ';
        result.push(c);
    }

    result.trim().to_string()
}
