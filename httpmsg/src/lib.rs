#![warn(rust_2018_idioms)]

mod error;
pub mod header;
pub mod message;
pub mod method;
pub mod parser;
pub mod statcodes;
pub mod uri;

pub use error::{Error, Result};
pub use header::{Header, HeaderId, HeaderMap};
pub use message::HttpMessage;
pub use method::HttpMethod;
pub use parser::{ParseStatus, Parser};
pub use statcodes::status_text;
pub use uri::{Uri, UriType};
