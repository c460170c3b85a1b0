#[cfg(test)]
mod event_loop_test;

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream, UdpSocket};

use crate::config::Shared;
use crate::dispatcher;
use crate::socket_set::SocketSet;
use crate::ssdp::{self, SsdpSlot};
use crate::state::MiniServerState;

/// The exact shutdown datagram: `"ShutDown"` plus the trailing NUL.
pub(crate) const STOP_PAYLOAD: &[u8] = b"ShutDown\0";

/// What woke the loop up.
enum Wake {
    Stop(usize, SocketAddr),
    StopErr(io::Error),
    Accept(HttpSlot, io::Result<(TcpStream, SocketAddr)>),
    Ssdp(SsdpSlot, io::Result<(Vec<u8>, SocketAddr)>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum HttpSlot {
    V4,
    V6Lla,
    V6UlaGua,
}

/// The persistent fan-in task over the miniserver socket set.
///
/// Owns the set for its whole life; on exit every socket is closed and the
/// state goes to Idle. The loop ends only on the signed stop datagram or a
/// fatal error on the stop socket; per-socket errors close the offending
/// slot and the loop continues.
pub(crate) struct EventLoop {
    sockets: SocketSet,
    shared: Arc<Shared>,
}

impl EventLoop {
    pub(crate) fn new(sockets: SocketSet, shared: Arc<Shared>) -> Self {
        EventLoop { sockets, shared }
    }

    pub(crate) async fn run(mut self) {
        log::info!(
            "miniserver: event loop running, stop socket on 127.0.0.1:{}",
            self.sockets.stop_port
        );
        self.shared.state.set(MiniServerState::Running);

        let mut stop_buf = [0u8; STOP_PAYLOAD.len() + 1];
        loop {
            let wake = {
                let sockets = &self.sockets;
                tokio::select! {
                    res = recv_stop(&sockets.stop, &mut stop_buf) => match res {
                        Ok((n, peer)) => Wake::Stop(n, peer),
                        Err(e) => Wake::StopErr(e),
                    },
                    res = accept_or_pending(&sockets.miniserver_v4) => Wake::Accept(HttpSlot::V4, res),
                    res = accept_or_pending(&sockets.miniserver_v6_lla) => Wake::Accept(HttpSlot::V6Lla, res),
                    res = accept_or_pending(&sockets.miniserver_v6_uadgua) => Wake::Accept(HttpSlot::V6UlaGua, res),
                    res = recv_ssdp_or_pending(&sockets.ssdp_v4) => Wake::Ssdp(SsdpSlot::V4, res),
                    res = recv_ssdp_or_pending(&sockets.ssdp_v6) => Wake::Ssdp(SsdpSlot::V6, res),
                    res = recv_ssdp_or_pending(&sockets.ssdp_v6_uadgua) => Wake::Ssdp(SsdpSlot::V6UlaGua, res),
                    res = recv_ssdp_or_pending(&sockets.ssdp_req_v4) => Wake::Ssdp(SsdpSlot::ReqV4, res),
                    res = recv_ssdp_or_pending(&sockets.ssdp_req_v6) => Wake::Ssdp(SsdpSlot::ReqV6, res),
                }
            };

            match wake {
                Wake::Stop(n, peer) => {
                    if is_stop_datagram(&stop_buf[..n], peer) {
                        log::info!(
                            "miniserver: received ordinary stop datagram from {peer}, stopping"
                        );
                        break;
                    }
                    log::error!(
                        "miniserver: received {:?} from {peer}, must be \"ShutDown\\0\" from \
                         127.0.0.1:*; not stopping",
                        String::from_utf8_lossy(&stop_buf[..n])
                    );
                }
                Wake::StopErr(e) => {
                    log::error!("miniserver: failed to receive on stop socket: {e}; stopping");
                    break;
                }
                Wake::Accept(slot, res) => self.on_accept(slot, res),
                Wake::Ssdp(slot, res) => self.on_ssdp(slot, res),
            }
        }

        // Close all sockets and free the set.
        drop(self.sockets);
        self.shared.state.set(MiniServerState::Idle);
    }

    /// Schedules a dispatch job for an accepted connection. Accept errors
    /// are logged and tolerated; the next iteration carries on.
    fn on_accept(&mut self, slot: HttpSlot, res: io::Result<(TcpStream, SocketAddr)>) {
        match res {
            Ok((stream, peer)) => {
                log::info!("miniserver: connected to host {peer} on {slot:?} listener");
                let shared = Arc::clone(&self.shared);
                tokio::spawn(dispatcher::handle_request(stream, peer, shared));
            }
            Err(e) => {
                log::error!("miniserver: error in accept on {slot:?} listener: {e}");
            }
        }
    }

    /// Hands a received SSDP datagram to its handler job; a receive error
    /// closes the socket and invalidates the slot.
    fn on_ssdp(&mut self, slot: SsdpSlot, res: io::Result<(Vec<u8>, SocketAddr)>) {
        match res {
            Ok((data, src)) => {
                let shared = Arc::clone(&self.shared);
                tokio::spawn(ssdp::handle_datagram(data, src, slot, shared));
            }
            Err(e) => {
                log::error!("miniserver: error reading SSDP socket {slot:?}: {e}; closing it");
                *self.ssdp_slot_mut(slot) = None;
            }
        }
    }

    fn ssdp_slot_mut(&mut self, slot: SsdpSlot) -> &mut Option<UdpSocket> {
        match slot {
            SsdpSlot::V4 => &mut self.sockets.ssdp_v4,
            SsdpSlot::V6 => &mut self.sockets.ssdp_v6,
            SsdpSlot::V6UlaGua => &mut self.sockets.ssdp_v6_uadgua,
            SsdpSlot::ReqV4 => &mut self.sockets.ssdp_req_v4,
            SsdpSlot::ReqV6 => &mut self.sockets.ssdp_req_v6,
        }
    }
}

/// Accepts only from 127.0.0.1 with the exact 9-byte payload. A zero
/// length datagram, a missing trailing NUL or any other peer is rejected.
fn is_stop_datagram(data: &[u8], peer: SocketAddr) -> bool {
    peer.ip() == IpAddr::V4(Ipv4Addr::LOCALHOST) && data == STOP_PAYLOAD
}

async fn recv_stop(sock: &UdpSocket, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
    sock.recv_from(buf).await
}

async fn accept_or_pending(
    listener: &Option<TcpListener>,
) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

/// One datagram into a fresh BUFSIZE buffer with one byte reserved so the
/// payload always has room for a terminator.
async fn recv_ssdp_or_pending(sock: &Option<UdpSocket>) -> io::Result<(Vec<u8>, SocketAddr)> {
    match sock {
        Some(sock) => {
            let mut buf = vec![0u8; ssdp::BUFSIZE];
            let (n, src) = sock.recv_from(&mut buf[..ssdp::BUFSIZE - 1]).await?;
            buf.truncate(n);
            Ok((buf, src))
        }
        None => std::future::pending().await,
    }
}
