use std::{io, net};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates the OS refused to hand out a socket descriptor.
    #[error("sock: out of socket resources")]
    ErrOutOfResources,

    /// Indicates bind() failed on the underlying socket.
    #[error("sock: failed to bind socket")]
    ErrSocketBind,

    /// Indicates listen() failed on the underlying socket.
    #[error("sock: failed to listen on socket")]
    ErrListen,

    /// Indicates the resolved address family does not match the socket family.
    #[error("sock: address family does not match socket family")]
    ErrWrongFamily,

    /// Indicates a stream-only operation was called on a datagram socket.
    #[error("sock: operation not supported for this socket type")]
    ErrWrongKind,

    /// Indicates bind() was called on a socket that is already bound.
    #[error("sock: socket is already bound")]
    ErrAlreadyBound,

    /// Indicates host/service could not be resolved to a socket address.
    #[error("sock: cannot resolve host or service to a socket address")]
    ErrNameResolution,

    /// Indicates a query on an empty or closed socket.
    #[error("sock: socket is not connected")]
    ErrNotConnected,

    /// Indicates an address family other than IPv4/IPv6.
    #[error("sock: unsupported address family")]
    ErrUnsupportedFamily,

    #[error("{0}")]
    Io(#[source] IoError),
    #[error("parse addr: {0}")]
    ParseIp(#[from] net::AddrParseError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}
