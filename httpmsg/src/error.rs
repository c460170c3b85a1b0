use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates a start line, header block or entity that does not parse.
    #[error("httpmsg: bad http message")]
    ErrBadHttpMessage,

    /// Indicates a request uri that is neither `*`, absolute, nor an
    /// absolute path.
    #[error("httpmsg: invalid uri")]
    ErrInvalidUri,

    #[error("{0}")]
    Other(String),
}
