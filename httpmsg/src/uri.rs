
use std::fmt;

use crate::error::*;

/// Classification of a request uri.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UriType {
    /// Scheme plus authority, e.g. `http://192.168.1.2:49152/desc.xml`.
    Absolute,
    /// Absolute path with optional query; the asterisk form `*` also
    /// parses as relative with a path-query of `*`.
    Relative,
}

/// A request uri in the minimal shape the miniserver needs: classified
/// type, optional scheme/authority, and the raw path-query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub kind: UriType,
    pub scheme: String,
    pub authority: String,
    pub path_query: String,
}

impl Default for Uri {
    fn default() -> Self {
        Uri {
            kind: UriType::Relative,
            scheme: String::new(),
            authority: String::new(),
            path_query: String::new(),
        }
    }
}

impl Uri {
    /// Parses a request-line uri.
    ///
    /// Accepted forms: `*`, an absolute uri with a scheme, or an absolute
    /// path starting with `/`.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::ErrInvalidUri);
        }
        if s == "*" {
            return Ok(Uri {
                kind: UriType::Relative,
                path_query: "*".to_owned(),
                ..Default::default()
            });
        }
        if let Some((scheme, rest)) = s.split_once("://") {
            if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
                return Err(Error::ErrInvalidUri);
            }
            let (authority, path_query) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, "/"),
            };
            if authority.is_empty() {
                return Err(Error::ErrInvalidUri);
            }
            return Ok(Uri {
                kind: UriType::Absolute,
                scheme: scheme.to_owned(),
                authority: authority.to_owned(),
                path_query: path_query.to_owned(),
            });
        }
        if s.starts_with('/') {
            return Ok(Uri {
                kind: UriType::Relative,
                path_query: s.to_owned(),
                ..Default::default()
            });
        }
        Err(Error::ErrInvalidUri)
    }

    pub fn is_asterisk(&self) -> bool {
        self.kind == UriType::Relative && self.path_query == "*"
    }

    /// The path component without the query.
    pub fn path(&self) -> &str {
        match self.path_query.split_once('?') {
            Some((path, _)) => path,
            None => &self.path_query,
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            UriType::Absolute => write!(f, "{}://{}{}", self.scheme, self.authority, self.path_query),
            UriType::Relative => write!(f, "{}", self.path_query),
        }
    }
}
