use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use httpmsg::HttpMessage;

use crate::error::*;
use crate::state::StateCell;

/// Per-message network deadline for request handling, in line with the
/// usual UPnP stack default.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Static network configuration, fixed for the lifetime of a server.
///
/// The interface literals play the role of the per-interface globals of a
/// classic UPnP stack: an empty string disables the corresponding
/// listener and SSDP socket family.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Numeric IPv4 interface address, e.g. `"192.168.1.2"`.
    pub if_ipv4: String,
    /// Numeric IPv6 link-local address without brackets, e.g. `"fe80::1"`.
    pub if_ipv6_lla: String,
    /// Numeric IPv6 unique-local or global address without brackets.
    pub if_ipv6_ula_gua: String,
    /// Interface index; the v6 scope id for link-local binds and the v6
    /// multicast interface.
    pub if_index: u32,
    /// Answer non-numeric Host headers with a 307 redirect to the bound
    /// numeric address instead of rejecting them.
    pub allow_literal_host_redirection: bool,
}

/// One accepted control-point connection, handed to request handlers.
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

impl Connection {
    /// Writes a full buffer within [`DEFAULT_HTTP_TIMEOUT`].
    pub async fn send(&mut self, buf: &[u8]) -> Result<()> {
        match tokio::time::timeout(DEFAULT_HTTP_TIMEOUT, self.stream.write_all(buf)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(Error::ErrTimeout),
        }
    }

    /// Reads into `buf` within [`DEFAULT_HTTP_TIMEOUT`]; 0 means the peer
    /// closed the connection.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        match tokio::time::timeout(DEFAULT_HTTP_TIMEOUT, self.stream.read(buf)).await {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(Error::ErrTimeout),
        }
    }
}

/// Handler for one class of parsed HTTP requests (SOAP, GENA or web).
///
/// The handler owns the response: it writes whatever it wants to the
/// connection; the dispatcher shuts the socket down afterwards.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, msg: &HttpMessage, conn: &mut Connection);
}

/// Custom Host-header validation, overriding the built-in numeric-literal
/// check on web requests.
pub trait HostValidator: Send + Sync {
    /// Returns false to reject the request with 400 Bad Request.
    fn validate(&self, host: &str) -> bool;
}

/// Receiver for validated SSDP traffic.
#[async_trait]
pub trait SsdpHandler: Send + Sync {
    /// A M-SEARCH request arrived on a multicast socket (device side).
    async fn on_device_request(&self, msg: &HttpMessage, src: SocketAddr);
    /// A NOTIFY or a M-SEARCH response arrived (control-point side).
    async fn on_ctrlpt_message(&self, msg: &HttpMessage, src: SocketAddr);
}

/// The registered callback slots, swapped in as one immutable record.
#[derive(Default, Clone)]
pub struct Callbacks {
    pub soap: Option<Arc<dyn RequestHandler>>,
    pub gena: Option<Arc<dyn RequestHandler>>,
    pub web: Option<Arc<dyn RequestHandler>>,
    pub host_validator: Option<Arc<dyn HostValidator>>,
    pub ssdp: Option<Arc<dyn SsdpHandler>>,
}

/// State shared between the server handle, the event loop and every
/// spawned job.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) callbacks: ArcSwapOption<Callbacks>,
    pub(crate) state: StateCell,
}

impl Shared {
    pub(crate) fn new(config: Config) -> Self {
        Shared {
            config,
            callbacks: ArcSwapOption::empty(),
            state: StateCell::new(),
        }
    }
}
