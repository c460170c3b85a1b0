#[cfg(test)]
mod header_test;

use std::fmt;

/// Identifier for the closed set of headers the stack inspects.
///
/// Everything else is carried as [`HeaderId::Unknown`] with its raw name.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderId {
    CacheControl,
    Callback,
    ContentLength,
    ContentType,
    Date,
    Ext,
    Host,
    Location,
    Man,
    Mx,
    Nt,
    Nts,
    Server,
    Seq,
    Sid,
    SoapAction,
    St,
    Timeout,
    TransferEncoding,
    Usn,
    UserAgent,
    Accept,
    AcceptEncoding,
    AcceptCharset,
    AcceptLanguage,
    AcceptRange,
    ContentEncoding,
    ContentLanguage,
    ContentLocation,
    ContentRange,
    IfRange,
    Range,
    Te,
    Unknown,
}

impl HeaderId {
    /// Maps a raw header name to its id; header names compare
    /// case-insensitively.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "cache-control" => Self::CacheControl,
            "callback" => Self::Callback,
            "content-length" => Self::ContentLength,
            "content-type" => Self::ContentType,
            "date" => Self::Date,
            "ext" => Self::Ext,
            "host" => Self::Host,
            "location" => Self::Location,
            "man" => Self::Man,
            "mx" => Self::Mx,
            "nt" => Self::Nt,
            "nts" => Self::Nts,
            "server" => Self::Server,
            "seq" => Self::Seq,
            "sid" => Self::Sid,
            "soapaction" => Self::SoapAction,
            "st" => Self::St,
            "timeout" => Self::Timeout,
            "transfer-encoding" => Self::TransferEncoding,
            "usn" => Self::Usn,
            "user-agent" => Self::UserAgent,
            "accept" => Self::Accept,
            "accept-encoding" => Self::AcceptEncoding,
            "accept-charset" => Self::AcceptCharset,
            "accept-language" => Self::AcceptLanguage,
            "accept-range" => Self::AcceptRange,
            "content-encoding" => Self::ContentEncoding,
            "content-language" => Self::ContentLanguage,
            "content-location" => Self::ContentLocation,
            "content-range" => Self::ContentRange,
            "if-range" => Self::IfRange,
            "range" => Self::Range,
            "te" => Self::Te,
            _ => Self::Unknown,
        }
    }
}

/// One parsed header: id, raw name and owned value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: HeaderId,
    pub name: String,
    pub value: Vec<u8>,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, String::from_utf8_lossy(&self.value))
    }
}

/// Order-preserving header multimap.
///
/// Repeated occurrences of a known header fold into the first entry with
/// a `", "` separator; unknown headers always append as separate entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    headers: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, value: &[u8]) {
        let id = HeaderId::from_name(name);
        if id != HeaderId::Unknown {
            if let Some(existing) = self.headers.iter_mut().find(|h| h.id == id) {
                existing.value.extend_from_slice(b", ");
                existing.value.extend_from_slice(value);
                return;
            }
        }
        self.headers.push(Header {
            id,
            name: name.to_owned(),
            value: value.to_vec(),
        });
    }

    /// First value for a known header id.
    pub fn find(&self, id: HeaderId) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.id == id)
            .map(|h| h.value.as_slice())
    }

    /// First value for a raw header name, case-insensitive.
    pub fn find_name(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_slice())
    }

    /// First value for a known header id as utf-8 text.
    pub fn find_text(&self, id: HeaderId) -> Option<&str> {
        self.find(id).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
