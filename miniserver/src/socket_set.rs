use tokio::net::{TcpListener, UdpSocket};

/// Ports actually bound by the three http listeners; 0 for a slot whose
/// interface is not configured or whose bind failed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoundPorts {
    pub v4: u16,
    pub v6_lla: u16,
    pub v6_uadgua: u16,
}

/// The fixed slot record of miniserver sockets.
///
/// A `None` slot is the "invalid socket" sentinel. The set is built by
/// start(), moved into the event loop task, and dropped (closing every
/// descriptor) when the loop exits. All intelligence lives elsewhere;
/// this is a plain container.
pub(crate) struct SocketSet {
    // http listeners
    pub(crate) miniserver_v4: Option<TcpListener>,
    pub(crate) miniserver_v6_lla: Option<TcpListener>,
    pub(crate) miniserver_v6_uadgua: Option<TcpListener>,
    // loopback shutdown channel; mandatory, start() fails without it
    pub(crate) stop: UdpSocket,
    // ssdp multicast group members
    pub(crate) ssdp_v4: Option<UdpSocket>,
    pub(crate) ssdp_v6: Option<UdpSocket>,
    pub(crate) ssdp_v6_uadgua: Option<UdpSocket>,
    // ssdp unicast request sockets (control point only)
    pub(crate) ssdp_req_v4: Option<UdpSocket>,
    pub(crate) ssdp_req_v6: Option<UdpSocket>,

    pub(crate) ports: BoundPorts,
    pub(crate) stop_port: u16,
}
