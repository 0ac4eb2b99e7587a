//! Connection lifecycle vocabulary.
//!
//! The transport itself (sockets, login handshake, reconnection) lives in the
//! embedding application; this module defines the events it reports and the
//! address parsing shared with it.

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

/// Port used when an address does not name one.
pub const DEFAULT_PORT: u16 = 27750;

/// Events reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection is up and the login handshake finished.
    Connected { address: String },
    /// The connection closed, expectedly or not.
    Disconnected { reason: String },
    /// The peer or transport reported an error. A disconnect usually follows.
    Error { message: String },
}

/// Split `host[:port]` into host and port.
///
/// A missing or unparseable port falls back to [`DEFAULT_PORT`]. Bare IPv6
/// literals pass through whole; a bracketed `[addr]:port` form splits at the
/// bracket.
#[must_use]
pub fn split_host_port(address: &str) -> (String, u16) {
    if let Some(rest) = address.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok()).unwrap_or(DEFAULT_PORT);
            return (host.to_string(), port);
        }
    }
    match address.rsplit_once(':') {
        // A colon left of the split means a bare IPv6 literal, not host:port.
        Some((host, _)) if host.contains(':') => (address.to_string(), DEFAULT_PORT),
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(DEFAULT_PORT)),
        None => (address.to_string(), DEFAULT_PORT),
    }
}
