#[cfg(test)]
mod socket_test;

use std::fmt;
use std::net::SocketAddr;

use parking_lot::Mutex;
use socket2::{Domain, Protocol, Type};

use crate::addrinfo::{self, ResolveFlags};
use crate::error::*;
use crate::netaddr;

const LISTEN_BACKLOG: i32 = 128; // same as Linux default

/// Address family of a managed socket.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
        };
        write!(f, "{s}")
    }
}

/// Kind of a managed socket.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SocketKind {
    Stream,
    Datagram,
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Stream => "stream",
            Self::Datagram => "datagram",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Default)]
struct SockState {
    bound: bool,
    listening: bool,
}

/// One owned OS socket with typed family and kind.
///
/// The wrapper tracks bind/listen state itself because a getsockname-based
/// query can race a concurrent listen() on the same object; the shadow
/// state lives behind a mutex. The descriptor is closed on drop. A Socket
/// is moved, never copied: two owners of one descriptor is a defect.
pub struct Socket {
    inner: socket2::Socket,
    family: AddressFamily,
    kind: SocketKind,
    state: Mutex<SockState>,
}

impl Socket {
    /// Opens an OS socket of the given family and kind.
    ///
    /// On Windows `SO_EXCLUSIVEADDRUSE` is set. `SO_REUSEADDR` is never
    /// set here; a bound address stays exclusive until TIME_WAIT expires.
    pub fn new(family: AddressFamily, kind: SocketKind) -> Result<Self> {
        let domain = match family {
            AddressFamily::Ipv4 => Domain::IPV4,
            AddressFamily::Ipv6 => Domain::IPV6,
        };
        let (ty, proto) = match kind {
            SocketKind::Stream => (Type::STREAM, Protocol::TCP),
            SocketKind::Datagram => (Type::DGRAM, Protocol::UDP),
        };
        let inner = socket2::Socket::new(domain, ty, Some(proto)).map_err(|e| {
            log::error!("socket({family}, {kind}) failed: {e}");
            Error::ErrOutOfResources
        })?;

        #[cfg(windows)]
        inner.set_exclusiveaddruse(true)?;

        Ok(Socket {
            inner,
            family,
            kind,
            state: Mutex::new(SockState::default()),
        })
    }

    /// Resolves `(node, service)` and binds the socket to the result.
    ///
    /// `flags.passive` with an empty node binds the wildcard address; an
    /// empty node without it binds loopback. Binding twice fails.
    pub fn bind(&self, node: &str, service: &str, flags: ResolveFlags) -> Result<()> {
        let addr = addrinfo::resolve(node, service, Some(self.family), self.kind, flags)?;
        self.bind_addr(addr)
    }

    /// Binds to an already resolved address.
    ///
    /// This is the entry point for callers that carry an IPv6 scope id in
    /// the address.
    pub fn bind_addr(&self, addr: SocketAddr) -> Result<()> {
        let mut state = self.state.lock();
        if state.bound {
            return Err(Error::ErrAlreadyBound);
        }
        match (self.family, &addr) {
            (AddressFamily::Ipv4, SocketAddr::V4(_)) | (AddressFamily::Ipv6, SocketAddr::V6(_)) => {}
            _ => return Err(Error::ErrWrongFamily),
        }
        // An IPv6 stream listener never serves mapped IPv4 peers; the
        // dual-stack case has its own IPv4 listener.
        if self.family == AddressFamily::Ipv6 && self.kind == SocketKind::Stream {
            self.inner.set_only_v6(true)?;
        }
        self.inner.bind(&addr.into()).map_err(|e| {
            log::error!("bind({}) failed: {e}", netaddr::to_netaddrp(&addr));
            Error::ErrSocketBind
        })?;
        state.bound = true;
        Ok(())
    }

    /// Marks a bound stream socket as accepting connections.
    ///
    /// Idempotent when already listening; datagram sockets fail.
    pub fn listen(&self) -> Result<()> {
        if self.kind != SocketKind::Stream {
            return Err(Error::ErrWrongKind);
        }
        let mut state = self.state.lock();
        if state.listening {
            return Ok(());
        }
        self.inner.listen(LISTEN_BACKLOG).map_err(|e| {
            log::error!("listen() failed: {e}");
            Error::ErrListen
        })?;
        state.listening = true;
        Ok(())
    }

    /// Sets `IPV6_V6ONLY`.
    ///
    /// Mutable only on an unbound IPv6 socket: a no-op after bind, ignored
    /// on IPv4.
    pub fn set_v6only(&self, on: bool) -> Result<()> {
        if self.family == AddressFamily::Ipv4 {
            return Ok(());
        }
        if self.state.lock().bound {
            return Ok(());
        }
        Ok(self.inner.set_only_v6(on)?)
    }

    /// Reads `IPV6_V6ONLY` back from the OS. Always false on IPv4.
    pub fn is_v6only(&self) -> Result<bool> {
        if self.family == AddressFamily::Ipv4 {
            return Ok(false);
        }
        Ok(self.inner.only_v6()?)
    }

    /// The local address as reported by getsockname.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let raw = self.inner.local_addr().map_err(|_| Error::ErrNotConnected)?;
        netaddr::from_sockaddr(&raw)
    }

    /// The bound ip address as text, e.g. `"[2001:db8::ab]"`.
    pub fn netaddr(&self) -> Result<String> {
        Ok(netaddr::to_netaddr(&self.local_addr()?))
    }

    /// The bound ip address with port as text, e.g. `"[2001:db8::ab]:50044"`.
    pub fn netaddrp(&self) -> Result<String> {
        Ok(netaddr::to_netaddrp(&self.local_addr()?))
    }

    /// The bound port as reported by getsockname.
    pub fn port(&self) -> Result<u16> {
        Ok(self.local_addr()?.port())
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// True if a bind was recorded on this object or getsockname reports a
    /// non-wildcard address or a non-zero port.
    pub fn is_bound(&self) -> bool {
        if self.state.lock().bound {
            return true;
        }
        match self.local_addr() {
            Ok(addr) => addr.port() > 0 || !addr.ip().is_unspecified(),
            Err(_) => false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.state.lock().listening
    }

    /// Grants the raw socket to callers that need to set options this
    /// wrapper does not model (multicast membership and friends).
    pub fn raw(&self) -> &socket2::Socket {
        &self.inner
    }

    /// Converts a listening stream socket into a tokio listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn into_tcp_listener(self) -> Result<tokio::net::TcpListener> {
        if self.kind != SocketKind::Stream {
            return Err(Error::ErrWrongKind);
        }
        self.inner.set_nonblocking(true)?;
        let std_listener: std::net::TcpListener = self.inner.into();
        Ok(tokio::net::TcpListener::from_std(std_listener)?)
    }

    /// Converts a datagram socket into a tokio UDP socket.
    ///
    /// Must be called from within a tokio runtime.
    pub fn into_udp_socket(self) -> Result<tokio::net::UdpSocket> {
        if self.kind != SocketKind::Datagram {
            return Err(Error::ErrWrongKind);
        }
        self.inner.set_nonblocking(true)?;
        let std_socket: std::net::UdpSocket = self.inner.into();
        Ok(tokio::net::UdpSocket::from_std(std_socket)?)
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("family", &self.family)
            .field("kind", &self.kind)
            .field("local_addr", &self.local_addr().ok())
            .finish()
    }
}
