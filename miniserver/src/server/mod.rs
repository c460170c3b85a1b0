
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::Mutex;

use sock::{AddressFamily, Socket, SocketKind};

use crate::config::{Callbacks, Config, Shared};
use crate::error::*;
use crate::event_loop::{EventLoop, STOP_PAYLOAD};
use crate::socket_set::{BoundPorts, SocketSet};
use crate::ssdp;
use crate::state::MiniServerState;

/// First dynamic and/or private port; the shared random listening port is
/// drawn from here through 65535.
const APPLICATION_LISTENING_PORT: u16 = 49152;

/// Startup barrier deadline, the classic 10 000 polls of 50 ms.
const STARTUP_TIMEOUT: Duration = Duration::from_millis(10_000 * 50);

#[derive(Default)]
struct Lifecycle {
    stop_port: u16,
    bound_ports: BoundPorts,
}

/// The miniserver: three HTTP listeners, the SSDP sockets and the
/// loopback stop channel behind one event loop.
///
/// ```no_run
/// # use upnp_miniserver::{Config, MiniServer};
/// # async fn run() -> upnp_miniserver::Result<()> {
/// let server = MiniServer::new(Config {
///     if_ipv4: "192.168.1.2".to_owned(),
///     ..Default::default()
/// });
/// let ports = server.start(0, 0, 0).await?;
/// println!("listening on port {}", ports.v4);
/// server.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct MiniServer {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl MiniServer {
    pub fn new(config: Config) -> Self {
        MiniServer {
            shared: Arc::new(Shared::new(config)),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    pub fn state(&self) -> MiniServerState {
        self.shared.state.get()
    }

    /// Registers the callback record. Only allowed while idle; the event
    /// loop and workers read the slots without locking.
    pub fn set_callbacks(&self, callbacks: Callbacks) -> Result<()> {
        if self.shared.state.get() != MiniServerState::Idle {
            return Err(Error::ErrAlreadyRunning);
        }
        self.shared.callbacks.store(Some(Arc::new(callbacks)));
        Ok(())
    }

    /// The ports bound by the last successful start().
    pub async fn bound_ports(&self) -> BoundPorts {
        self.lifecycle.lock().await.bound_ports
    }

    /// The loopback port the stop socket is bound to; 0 before the first
    /// start().
    pub async fn stop_port(&self) -> u16 {
        self.lifecycle.lock().await.stop_port
    }

    /// Brings the miniserver up.
    ///
    /// A zero port requests one shared random port from the dynamic range
    /// for every zero slot. Listeners come up per configured interface;
    /// individual failures are tolerated as long as at least one listener
    /// binds. Returns the bound ports once the event loop reports
    /// Running.
    pub async fn start(
        &self,
        port_v4: u16,
        port_v6_lla: u16,
        port_v6_uadgua: u16,
    ) -> Result<BoundPorts> {
        log::info!(
            "miniserver: starting with ports {port_v4}/{port_v6_lla}/{port_v6_uadgua}"
        );
        let mut lifecycle = self.lifecycle.lock().await;
        if self.shared.state.get() != MiniServerState::Idle {
            log::error!("miniserver: cannot start, already running");
            return Err(Error::ErrAlreadyRunning);
        }

        let (mut port_v4, mut port_v6_lla, mut port_v6_uadgua) =
            (port_v4, port_v6_lla, port_v6_uadgua);
        if port_v4 == 0 || port_v6_lla == 0 || port_v6_uadgua == 0 {
            // Without SO_REUSEADDR a previously used address is blocked
            // until TIME_WAIT expires, so absent user ports get one fresh
            // random port, shared across the slots.
            let listen_port =
                rand::thread_rng().gen_range(APPLICATION_LISTENING_PORT..=u16::MAX);
            if port_v4 == 0 {
                port_v4 = listen_port;
            }
            if port_v6_lla == 0 {
                port_v6_lla = listen_port;
            }
            if port_v6_uadgua == 0 {
                port_v6_uadgua = listen_port;
            }
        }

        // V4 and V6 http listeners.
        let config = &self.shared.config;
        let mut ports = BoundPorts::default();
        let mut listener_v4 = None;
        let mut listener_v6_lla = None;
        let mut listener_v6_uadgua = None;
        let mut last_err = Error::ErrOutOfResources;

        if !config.if_ipv6_lla.is_empty() {
            match config
                .if_ipv6_lla
                .parse::<Ipv6Addr>()
                .map_err(|_| Error::ErrNameResolution)
                .and_then(|ip| {
                    // The scope id travels with the link-local address.
                    open_http_listener(
                        SocketAddrV6::new(ip, port_v6_lla, 0, config.if_index).into(),
                    )
                }) {
                Ok((listener, port)) => {
                    listener_v6_lla = Some(listener);
                    ports.v6_lla = port;
                }
                Err(e) => {
                    log::error!("miniserver: LLA listener on [{}] failed: {e}", config.if_ipv6_lla);
                    last_err = e;
                }
            }
        }
        if !config.if_ipv6_ula_gua.is_empty() {
            match config
                .if_ipv6_ula_gua
                .parse::<Ipv6Addr>()
                .map_err(|_| Error::ErrNameResolution)
                .and_then(|ip| {
                    open_http_listener(SocketAddrV6::new(ip, port_v6_uadgua, 0, 0).into())
                }) {
                Ok((listener, port)) => {
                    listener_v6_uadgua = Some(listener);
                    ports.v6_uadgua = port;
                }
                Err(e) => {
                    log::error!(
                        "miniserver: UAD/GUA listener on [{}] failed: {e}",
                        config.if_ipv6_ula_gua
                    );
                    last_err = e;
                }
            }
        }
        if !config.if_ipv4.is_empty() {
            match config
                .if_ipv4
                .parse::<Ipv4Addr>()
                .map_err(|_| Error::ErrNameResolution)
                .and_then(|ip| open_http_listener(SocketAddrV4::new(ip, port_v4).into()))
            {
                Ok((listener, port)) => {
                    listener_v4 = Some(listener);
                    ports.v4 = port;
                }
                Err(e) => {
                    log::error!("miniserver: IPv4 listener on {} failed: {e}", config.if_ipv4);
                    last_err = e;
                }
            }
        }
        if listener_v4.is_none() && listener_v6_lla.is_none() && listener_v6_uadgua.is_none() {
            return Err(last_err);
        }

        // Stop socket, to end miniserver processing.
        let (stop, stop_port) = open_stop_socket()?;
        log::info!("miniserver: bound stop socket to 127.0.0.1:{stop_port}");

        // SSDP sockets for discovery/advertising. An error here unwinds
        // everything opened so far.
        let ssdp_sockets = ssdp::get_ssdp_sockets(config)?;

        let sockets = SocketSet {
            miniserver_v4: listener_v4,
            miniserver_v6_lla: listener_v6_lla,
            miniserver_v6_uadgua: listener_v6_uadgua,
            stop,
            ssdp_v4: ssdp_sockets.ssdp_v4,
            ssdp_v6: ssdp_sockets.ssdp_v6,
            ssdp_v6_uadgua: ssdp_sockets.ssdp_v6_uadgua,
            ssdp_req_v4: ssdp_sockets.req_v4,
            ssdp_req_v6: ssdp_sockets.req_v6,
            ports,
            stop_port,
        };

        let handle = tokio::spawn(EventLoop::new(sockets, Arc::clone(&self.shared)).run());

        // Wait for the miniserver to start.
        if !self
            .shared
            .state
            .wait_for(MiniServerState::Running, STARTUP_TIMEOUT)
            .await
        {
            // Took too long to start that task.
            handle.abort();
            self.shared.state.set(MiniServerState::Idle);
            return Err(Error::ErrInternalError);
        }

        lifecycle.stop_port = stop_port;
        lifecycle.bound_ports = ports;
        Ok(ports)
    }

    /// Stops the miniserver and waits until it is idle.
    ///
    /// Returns success immediately when the server is not running. The
    /// stop datagram is re-sent every second until the event loop
    /// confirms by transitioning to Idle; delivery needs no confirmation
    /// because of that loop.
    pub async fn stop(&self) -> Result<()> {
        let lifecycle = self.lifecycle.lock().await;
        if !self
            .shared
            .state
            .transition(MiniServerState::Running, MiniServerState::Stopping)
        {
            return Ok(());
        }

        let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        let target = SocketAddr::from((Ipv4Addr::LOCALHOST, lifecycle.stop_port));
        while self.shared.state.get() != MiniServerState::Idle {
            // All nine bytes go out: the receiver compares the trailing
            // NUL too.
            if let Err(e) = sock.send_to(STOP_PAYLOAD, target).await {
                log::error!("miniserver: error sending stop datagram: {e}");
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
            if self.shared.state.get() == MiniServerState::Idle {
                break;
            }
            if self
                .shared
                .state
                .wait_for(MiniServerState::Idle, Duration::from_secs(1))
                .await
            {
                break;
            }
        }
        Ok(())
    }
}

fn open_http_listener(addr: SocketAddr) -> Result<(TcpListener, u16)> {
    let family = if addr.is_ipv4() {
        AddressFamily::Ipv4
    } else {
        AddressFamily::Ipv6
    };
    let sock = Socket::new(family, SocketKind::Stream)?;
    sock.bind_addr(addr)?;
    sock.listen()?;
    let port = sock.port()?;
    Ok((sock.into_tcp_listener()?, port))
}

/// The datagram socket bound to localhost that will later be listened on
/// to know when it is time to stop the miniserver.
fn open_stop_socket() -> Result<(UdpSocket, u16)> {
    let sock = Socket::new(AddressFamily::Ipv4, SocketKind::Datagram)?;
    sock.bind_addr(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0).into())?;
    let port = sock.port()?;
    Ok((sock.into_udp_socket()?, port))
}
