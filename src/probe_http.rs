use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use url::Url;

/// Reachability probe for one candidate endpoint. Any HTTP response at all
/// counts as reachable; the status line is not inspected. A connection or
/// socket failure means the backend is not reachable yet.
pub(crate) fn probe_endpoint(candidate: &str, timeout: Duration) -> bool {
    let parsed = match Url::parse(candidate) {
        Ok(url) => url,
        Err(_) => return false,
    };
    let host = match parsed.host_str() {
        Some(host) => host.to_string(),
        None => return false,
    };
    let port = parsed.port_or_known_default().unwrap_or(80);
    let timeout = timeout.max(Duration::from_millis(50));

    let addresses = match (host.as_str(), port).to_socket_addrs() {
        Ok(addresses) => addresses.collect::<Vec<_>>(),
        Err(_) => return false,
    };
    addresses
        .iter()
        .any(|address| probe_address(address, &host, parsed.path(), timeout))
}

fn probe_address(address: &SocketAddr, host: &str, path: &str, timeout: Duration) -> bool {
    let mut stream = match TcpStream::connect_timeout(address, timeout) {
        Ok(stream) => stream,
        Err(_) => return false,
    };
    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));

    let path = if path.is_empty() { "/" } else { path };
    let request = format!("GET {path} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    if stream.write_all(request.as_bytes()).is_err() {
        return false;
    }

    let mut buffer = [0u8; 1];
    matches!(stream.read(&mut buffer), Ok(read) if read > 0)
}
