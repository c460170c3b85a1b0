
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::sync::Arc;

use tokio::net::UdpSocket;

use httpmsg::{HeaderId, HttpMessage, HttpMethod, ParseStatus, Parser, UriType};
use sock::{AddressFamily, Socket, SocketKind};

use crate::config::{Config, Shared};
use crate::error::*;

/// SSDP well-known port.
pub const SSDP_PORT: u16 = 1900;
/// IPv4 site-local multicast group.
pub const SSDP_IP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
/// IPv6 link-local multicast group `FF02::C`.
pub const SSDP_IPV6_LINKLOCAL: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xc);
/// IPv6 site-local multicast group `FF05::C`.
pub const SSDP_IPV6_SITELOCAL: Ipv6Addr = Ipv6Addr::new(0xff05, 0, 0, 0, 0, 0, 0, 0xc);

/// Datagram receive buffer size, one byte of which stays reserved as a
/// terminator.
pub(crate) const BUFSIZE: usize = 2500;

const SSDP_MCAST_TTL: u32 = 4;

/// The HOST header values a multicast SSDP request may legitimately carry.
const SSDP_HOSTS: [&str; 5] = [
    "239.255.255.250:1900",
    "[FF02::C]:1900",
    "[ff02::c]:1900",
    "[FF05::C]:1900",
    "[ff05::c]:1900",
];

/// Which SSDP slot a datagram arrived on; request sockets parse replies,
/// multicast sockets parse requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SsdpSlot {
    V4,
    V6,
    V6UlaGua,
    ReqV4,
    ReqV6,
}

impl SsdpSlot {
    fn is_request_socket(&self) -> bool {
        matches!(self, SsdpSlot::ReqV4 | SsdpSlot::ReqV6)
    }
}

/// The SSDP sockets created for a configuration; moved into the
/// [`crate::socket_set::SocketSet`] by start().
pub(crate) struct SsdpSockets {
    pub(crate) ssdp_v4: Option<UdpSocket>,
    pub(crate) ssdp_v6: Option<UdpSocket>,
    pub(crate) ssdp_v6_uadgua: Option<UdpSocket>,
    pub(crate) req_v4: Option<UdpSocket>,
    pub(crate) req_v6: Option<UdpSocket>,
}

/// One SSDP handler job: parses, validates and routes a received
/// datagram. The job owns the buffer; everything is dropped on any early
/// return.
pub(crate) async fn handle_datagram(
    data: Vec<u8>,
    src: SocketAddr,
    slot: SsdpSlot,
    shared: Arc<Shared>,
) {
    let mut parser = if slot.is_request_socket() {
        Parser::for_response(HttpMethod::MSearch)
    } else {
        Parser::for_request()
    };

    let mut status = parser.parse(&data);
    if status == ParseStatus::Incomplete {
        // The datagram is the whole message.
        status = parser.finish();
    }
    match status {
        ParseStatus::Success => {}
        ParseStatus::Failure(code) => {
            // NOTIFY messages missing a content-length are still valid
            // SSDP; everything else is dropped.
            if parser.message().method != HttpMethod::Notify || !parser.valid_ssdp_notify_hack() {
                log::info!("ssdp: received bad msg from {src}, code {code}");
                return;
            }
        }
        ParseStatus::Incomplete => return,
    }

    let msg = parser.into_message();
    if !valid_ssdp_msg(&msg) {
        return;
    }

    let Some(callbacks) = shared.callbacks.load_full() else {
        return;
    };
    let Some(handler) = callbacks.ssdp.clone() else {
        return;
    };
    if msg.method == HttpMethod::Notify || msg.request_method == HttpMethod::MSearch {
        handler.on_ctrlpt_message(&msg, src).await;
    } else {
        handler.on_device_request(&msg, src).await;
    }
}

/// Quick validity check of a parsed SSDP message.
pub(crate) fn valid_ssdp_msg(msg: &HttpMessage) -> bool {
    // valid methods are NOTIFY, M-SEARCH, or a M-SEARCH response
    if msg.method != HttpMethod::Notify
        && msg.method != HttpMethod::MSearch
        && msg.request_method != HttpMethod::MSearch
    {
        return false;
    }
    if msg.request_method != HttpMethod::MSearch {
        // check PATH == "*"
        if msg.uri.kind != UriType::Relative || msg.uri.path_query != "*" {
            return false;
        }
        // check HOST header
        match msg.headers.find_text(HeaderId::Host) {
            Some(host) if SSDP_HOSTS.contains(&host) => {}
            _ => {
                log::info!("ssdp: invalid HOST header from SSDP message");
                return false;
            }
        }
    }
    true
}

/// Creates every SSDP socket the configuration asks for.
///
/// Request sockets come first so an error there does not orphan the
/// multicast memberships; any error drops whatever was opened before.
pub(crate) fn get_ssdp_sockets(config: &Config) -> Result<SsdpSockets> {
    let mut out = SsdpSockets {
        ssdp_v4: None,
        ssdp_v6: None,
        ssdp_v6_uadgua: None,
        req_v4: None,
        req_v6: None,
    };

    // Unicast request sockets for the control point.
    if !config.if_ipv4.is_empty() {
        out.req_v4 = Some(create_ssdp_sock_reqv4(&config.if_ipv4)?);
    }
    if !config.if_ipv6_lla.is_empty() {
        out.req_v6 = Some(create_ssdp_sock_reqv6(&config.if_ipv6_lla, config.if_index)?);
    }

    // Multicast group members.
    if !config.if_ipv4.is_empty() {
        out.ssdp_v4 = Some(create_ssdp_sock_v4(&config.if_ipv4)?);
    }
    if !config.if_ipv6_lla.is_empty() {
        out.ssdp_v6 = Some(create_ssdp_sock_v6(
            SSDP_IPV6_LINKLOCAL,
            config.if_index,
        )?);
    }
    if !config.if_ipv6_ula_gua.is_empty() {
        out.ssdp_v6_uadgua = Some(create_ssdp_sock_v6(
            SSDP_IPV6_SITELOCAL,
            config.if_index,
        )?);
    }

    Ok(out)
}

/// IPv4 multicast member socket: wildcard:1900, reuse enabled, joined to
/// the SSDP group on the configured interface.
fn create_ssdp_sock_v4(if_ipv4: &str) -> Result<UdpSocket> {
    let iface: Ipv4Addr = if_ipv4.parse().map_err(|_| Error::ErrNameResolution)?;

    let sock = Socket::new(AddressFamily::Ipv4, SocketKind::Datagram)?;
    sock.raw().set_reuse_address(true)?;
    #[cfg(any(
        target_os = "macos",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    sock.raw().set_reuse_port(true)?;

    sock.bind_addr(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, SSDP_PORT).into())?;

    sock.raw().join_multicast_v4(&SSDP_IP, &iface).map_err(|e| {
        log::error!("ssdp: error joining multicast group on {iface}: {e}");
        Error::from(e)
    })?;
    // Set multicast interface; probably not a critical error.
    if let Err(e) = sock.raw().set_multicast_if_v4(&iface) {
        log::info!("ssdp: error setting multicast interface {iface}: {e}");
    }
    let _ = sock.raw().set_multicast_ttl_v4(SSDP_MCAST_TTL);
    sock.raw().set_broadcast(true)?;

    Ok(sock.into_udp_socket()?)
}

/// IPv6 multicast member socket for one group (link-local or
/// site-local), v6-only, joined on the configured interface index.
fn create_ssdp_sock_v6(group: Ipv6Addr, if_index: u32) -> Result<UdpSocket> {
    let sock = Socket::new(AddressFamily::Ipv6, SocketKind::Datagram)?;
    sock.raw().set_reuse_address(true)?;
    #[cfg(any(
        target_os = "macos",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    sock.raw().set_reuse_port(true)?;
    sock.set_v6only(true)?;

    sock.bind_addr(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, SSDP_PORT, 0, if_index).into())?;

    sock.raw().join_multicast_v6(&group, if_index).map_err(|e| {
        log::error!("ssdp: error joining multicast group {group} on index {if_index}: {e}");
        Error::from(e)
    })?;
    if let Err(e) = sock.raw().set_multicast_if_v6(if_index) {
        log::info!("ssdp: error setting multicast interface index {if_index}: {e}");
    }
    sock.raw().set_broadcast(true)?;

    Ok(sock.into_udp_socket()?)
}

/// IPv4 unicast request socket for control-point searches; bound to an
/// ephemeral port on the interface so search replies can be received.
fn create_ssdp_sock_reqv4(if_ipv4: &str) -> Result<UdpSocket> {
    let iface: Ipv4Addr = if_ipv4.parse().map_err(|_| Error::ErrNameResolution)?;

    let sock = Socket::new(AddressFamily::Ipv4, SocketKind::Datagram)?;
    let _ = sock.raw().set_multicast_ttl_v4(SSDP_MCAST_TTL);
    sock.bind_addr(SocketAddrV4::new(iface, 0).into())?;

    Ok(sock.into_udp_socket()?)
}

/// IPv6 unicast request socket, bound to the link-local address with its
/// scope id.
fn create_ssdp_sock_reqv6(if_ipv6: &str, if_index: u32) -> Result<UdpSocket> {
    let iface: Ipv6Addr = if_ipv6.parse().map_err(|_| Error::ErrNameResolution)?;

    let sock = Socket::new(AddressFamily::Ipv6, SocketKind::Datagram)?;
    sock.set_v6only(true)?;
    let _ = sock.raw().set_multicast_hops_v6(1);
    sock.bind_addr(SocketAddrV6::new(iface, 0, 0, if_index).into())?;

    Ok(sock.into_udp_socket()?)
}
