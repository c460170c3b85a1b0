use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates socket creation, allocation or task submission failed.
    #[error("miniserver: out of resources")]
    ErrOutOfResources,

    /// Indicates bind() failed on a listener or UDP socket.
    #[error("miniserver: failed to bind socket")]
    ErrSocketBind,

    /// Indicates listen() failed on a http listener.
    #[error("miniserver: failed to listen on socket")]
    ErrListen,

    /// Indicates start() was called while the server is not idle.
    #[error("miniserver: already running")]
    ErrAlreadyRunning,

    /// Indicates host/service resolution failed.
    #[error("miniserver: cannot resolve host or service")]
    ErrNameResolution,

    /// Indicates an operation on a closed or error-state socket.
    #[error("miniserver: socket is not connected")]
    ErrNotConnected,

    /// Indicates an invalid http message, a missing Host header, or a
    /// non-numeric Host without redirection enabled.
    #[error("miniserver: bad http message")]
    ErrBadHttpMessage,

    /// Indicates no callback is registered for the request method.
    #[error("miniserver: no callback registered for method")]
    ErrInternalServerError,

    /// Indicates a read or write exceeded the per-message deadline.
    #[error("miniserver: network operation timed out")]
    ErrTimeout,

    /// Indicates the startup barrier expired or the server state is
    /// inconsistent.
    #[error("miniserver: internal error")]
    ErrInternalError,

    #[error("{0}")]
    Sock(#[from] sock::Error),
    #[error("{0}")]
    Io(#[source] IoError),
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
