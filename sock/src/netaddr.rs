
use std::net::SocketAddr;

use crate::error::*;

/// Formats the ip address of `addr` as text without the port.
///
/// Example: may return `"[2001:db8::ab]"` or `"192.168.1.2"`.
pub fn to_netaddr(addr: &SocketAddr) -> String {
    match addr {
        SocketAddr::V4(a) => a.ip().to_string(),
        SocketAddr::V6(a) => format!("[{}]", a.ip()),
    }
}

/// Formats `addr` as text with the port appended.
///
/// Example: may return `"[2001:db8::ab]:50044"` or `"192.168.1.2:54321"`.
pub fn to_netaddrp(addr: &SocketAddr) -> String {
    match addr {
        SocketAddr::V4(a) => format!("{}:{}", a.ip(), a.port()),
        SocketAddr::V6(a) => format!("[{}]:{}", a.ip(), a.port()),
    }
}

/// Converts a raw `socket2` address into a `SocketAddr`.
///
/// Fails for address families other than IPv4/IPv6, e.g. unix domain
/// sockets.
pub fn from_sockaddr(addr: &socket2::SockAddr) -> Result<SocketAddr> {
    addr.as_socket().ok_or(Error::ErrUnsupportedFamily)
}
