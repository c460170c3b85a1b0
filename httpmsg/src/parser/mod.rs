#[cfg(test)]
mod parser_test;

use bytes::BytesMut;

use crate::header::HeaderId;
use crate::message::HttpMessage;
use crate::method::HttpMethod;
use crate::uri::Uri;

/// Result of one incremental parse step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    /// The message is complete.
    Success,
    /// More data is needed to continue.
    Incomplete,
    /// The message is invalid; the payload is the HTTP error code (4xx or
    /// 5xx) to answer with.
    Failure(u16),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Position {
    StartLine,
    Headers,
    Entity,
    Complete,
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum EntityFraming {
    Length(usize),
    Chunked,
    UntilClose,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ChunkState {
    Size,
    Data(usize),
    DataCrlf,
    Trailer,
}

/// Incremental push parser for HTTP requests and responses, including the
/// UPnP extension methods and the SSDP quirks.
///
/// Feed wire bytes with [`Parser::parse`] until it reports something other
/// than [`ParseStatus::Incomplete`]; call [`Parser::finish`] when the peer
/// closes the connection (or the datagram is fully loaded) so that
/// read-until-close entities resolve.
pub struct Parser {
    msg: HttpMessage,
    buf: BytesMut,
    cursor: usize,
    position: Position,
    framing: Option<EntityFraming>,
    chunk_state: ChunkState,
    error_code: u16,
    valid_ssdp_notify_hack: bool,
    eof: bool,
}

impl Parser {
    /// Parser for an incoming request.
    pub fn for_request() -> Self {
        Self::new(HttpMessage::new_request())
    }

    /// Parser for an incoming response to `request_method`.
    ///
    /// The hint drives the no-entity rule for HEAD and is recorded on the
    /// message so SSDP ingress can recognize M-SEARCH replies.
    pub fn for_response(request_method: HttpMethod) -> Self {
        Self::new(HttpMessage::new_response(request_method))
    }

    fn new(msg: HttpMessage) -> Self {
        Parser {
            msg,
            buf: BytesMut::new(),
            cursor: 0,
            position: Position::StartLine,
            framing: None,
            chunk_state: ChunkState::Size,
            error_code: 0,
            valid_ssdp_notify_hack: false,
            eof: false,
        }
    }

    /// Appends `chunk` and parses as far as the data allows.
    pub fn parse(&mut self, chunk: &[u8]) -> ParseStatus {
        self.buf.extend_from_slice(chunk);
        self.advance()
    }

    /// Signals end of input (connection closed, or the entire datagram was
    /// fed). Read-until-close entities complete here; everything else
    /// still missing data becomes a failure.
    pub fn finish(&mut self) -> ParseStatus {
        self.eof = true;
        self.advance()
    }

    pub fn message(&self) -> &HttpMessage {
        &self.msg
    }

    pub fn into_message(self) -> HttpMessage {
        self.msg
    }

    /// HTTP error code after a [`ParseStatus::Failure`]; 0 otherwise.
    pub fn http_error_code(&self) -> u16 {
        self.error_code
    }

    /// True when a NOTIFY request had no Content-Length. SSDP tolerates
    /// such messages even though the parser reports failure.
    pub fn valid_ssdp_notify_hack(&self) -> bool {
        self.valid_ssdp_notify_hack
    }

    fn advance(&mut self) -> ParseStatus {
        loop {
            let status = match self.position {
                Position::Failed => return ParseStatus::Failure(self.error_code),
                Position::Complete => return ParseStatus::Success,
                Position::StartLine => self.parse_start_line(),
                Position::Headers => self.parse_headers(),
                Position::Entity => self.parse_entity(),
            };
            if let Some(status) = status {
                return status;
            }
        }
    }

    fn fail(&mut self, code: u16) -> Option<ParseStatus> {
        self.position = Position::Failed;
        self.error_code = code;
        Some(ParseStatus::Failure(code))
    }

    /// More input required; at eof that means the message was truncated.
    fn need_more(&mut self) -> Option<ParseStatus> {
        if self.eof {
            self.fail(400)
        } else {
            Some(ParseStatus::Incomplete)
        }
    }

    fn find_crlf(&self, from: usize) -> Option<usize> {
        find_seq(&self.buf, b"\r\n", from)
    }

    fn parse_start_line(&mut self) -> Option<ParseStatus> {
        let line_end = match self.find_crlf(self.cursor) {
            Some(i) => i,
            None => return self.need_more(),
        };
        let line = match std::str::from_utf8(&self.buf[self.cursor..line_end]) {
            Ok(l) => l.to_owned(),
            Err(_) => return self.fail(400),
        };
        if self.msg.is_request {
            let mut tokens = line.split_whitespace();
            let (method, uri, version) = match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
                (Some(m), Some(u), Some(v), None) => (m, u, v),
                _ => return self.fail(400),
            };
            self.msg.method = HttpMethod::from_token(method);
            if self.msg.method == HttpMethod::Unknown {
                return self.fail(501);
            }
            self.msg.uri = match Uri::parse(uri) {
                Ok(u) => u,
                Err(_) => return self.fail(400),
            };
            let (major, minor) = match parse_version(version) {
                Some(v) => v,
                None => return self.fail(400),
            };
            self.msg.major_version = major;
            self.msg.minor_version = minor;
        } else {
            let mut tokens = line.splitn(3, ' ');
            let (version, code) = match (tokens.next(), tokens.next()) {
                (Some(v), Some(c)) => (v, c),
                _ => return self.fail(400),
            };
            let (major, minor) = match parse_version(version) {
                Some(v) => v,
                None => return self.fail(400),
            };
            self.msg.major_version = major;
            self.msg.minor_version = minor;
            self.msg.status_code = match code.parse::<u16>() {
                Ok(c) if (100..=599).contains(&c) => c,
                _ => return self.fail(400),
            };
            self.msg.status_msg = tokens.next().unwrap_or("").to_owned();
        }
        self.cursor = line_end + 2;
        self.position = Position::Headers;
        None
    }

    fn parse_headers(&mut self) -> Option<ParseStatus> {
        // Wait until the whole header block is visible, then scan it in
        // one pass; this keeps continuation lines trivial.
        let block_end = if self.buf.get(self.cursor..self.cursor + 2) == Some(&b"\r\n"[..]) {
            self.cursor
        } else {
            match find_seq(&self.buf, b"\r\n\r\n", self.cursor) {
                Some(i) => i + 2,
                None => return self.need_more(),
            }
        };

        let block = self.buf[self.cursor..block_end].to_vec();
        self.cursor = block_end + 2;

        let mut current: Option<(String, Vec<u8>)> = None;
        for line in block.split_crlf_lines() {
            if line.first() == Some(&b' ') || line.first() == Some(&b'\t') {
                // obs-fold continuation of the previous header value
                match current.as_mut() {
                    Some((_, value)) => {
                        value.push(b' ');
                        value.extend_from_slice(trim_bytes(line));
                    }
                    None => return self.fail(400),
                }
                continue;
            }
            if let Some((name, value)) = current.take() {
                self.msg.headers.add(&name, &value);
            }
            let colon = match line.iter().position(|&b| b == b':') {
                Some(i) => i,
                None => return self.fail(400),
            };
            let name = match std::str::from_utf8(&line[..colon]) {
                Ok(n) if !n.is_empty() && !n.contains(char::is_whitespace) => n.to_owned(),
                _ => return self.fail(400),
            };
            let value = trim_bytes(&line[colon + 1..]).to_vec();
            current = Some((name, value));
        }
        if let Some((name, value)) = current.take() {
            self.msg.headers.add(&name, &value);
        }

        self.determine_framing()
    }

    /// Standard framing rules plus the UPnP additions: POST-family
    /// requests must declare a length, and a NOTIFY without one fails 411
    /// with the SSDP tolerance flag raised.
    fn determine_framing(&mut self) -> Option<ParseStatus> {
        let chunked = self
            .msg
            .headers
            .find_text(HeaderId::TransferEncoding)
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
        let content_length = match self.msg.headers.find_text(HeaderId::ContentLength) {
            Some(text) => match text.trim().parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => return self.fail(400),
            },
            None => None,
        };

        let framing = if self.msg.is_request {
            if chunked {
                Some(EntityFraming::Chunked)
            } else if let Some(n) = content_length {
                Some(EntityFraming::Length(n))
            } else {
                match self.msg.method {
                    HttpMethod::Notify => {
                        self.valid_ssdp_notify_hack = true;
                        return self.fail(411);
                    }
                    HttpMethod::Post | HttpMethod::MPost | HttpMethod::SoapPost => {
                        return self.fail(411);
                    }
                    _ => None,
                }
            }
        } else {
            let no_entity = matches!(self.msg.status_code, 100..=199 | 204 | 304)
                || self.msg.request_method == HttpMethod::Head;
            if no_entity {
                None
            } else if chunked {
                Some(EntityFraming::Chunked)
            } else if let Some(n) = content_length {
                Some(EntityFraming::Length(n))
            } else {
                Some(EntityFraming::UntilClose)
            }
        };

        match framing {
            None | Some(EntityFraming::Length(0)) => {
                self.position = Position::Complete;
            }
            some => {
                self.framing = some;
                self.position = Position::Entity;
            }
        }
        None
    }

    fn parse_entity(&mut self) -> Option<ParseStatus> {
        match self.framing {
            Some(EntityFraming::Length(n)) => {
                if self.buf.len() - self.cursor < n {
                    return self.need_more();
                }
                self.msg.entity = self.buf[self.cursor..self.cursor + n].to_vec();
                self.cursor += n;
                self.position = Position::Complete;
                None
            }
            Some(EntityFraming::Chunked) => self.parse_chunked(),
            Some(EntityFraming::UntilClose) => {
                if !self.eof {
                    return Some(ParseStatus::Incomplete);
                }
                self.msg.entity.extend_from_slice(&self.buf[self.cursor..]);
                self.cursor = self.buf.len();
                self.position = Position::Complete;
                None
            }
            None => {
                self.position = Position::Complete;
                None
            }
        }
    }

    fn parse_chunked(&mut self) -> Option<ParseStatus> {
        loop {
            match self.chunk_state {
                ChunkState::Size => {
                    let line_end = match self.find_crlf(self.cursor) {
                        Some(i) => i,
                        None => return self.need_more(),
                    };
                    let line = match std::str::from_utf8(&self.buf[self.cursor..line_end]) {
                        Ok(l) => l,
                        Err(_) => return self.fail(400),
                    };
                    let size_token = line.split(';').next().unwrap_or("").trim();
                    let size = match usize::from_str_radix(size_token, 16) {
                        Ok(n) => n,
                        Err(_) => return self.fail(400),
                    };
                    self.cursor = line_end + 2;
                    self.chunk_state = if size == 0 {
                        ChunkState::Trailer
                    } else {
                        ChunkState::Data(size)
                    };
                }
                ChunkState::Data(size) => {
                    if self.buf.len() - self.cursor < size {
                        return self.need_more();
                    }
                    self.msg
                        .entity
                        .extend_from_slice(&self.buf[self.cursor..self.cursor + size]);
                    self.cursor += size;
                    self.chunk_state = ChunkState::DataCrlf;
                }
                ChunkState::DataCrlf => {
                    match self.buf.get(self.cursor..self.cursor + 2) {
                        Some(b"\r\n") => {
                            self.cursor += 2;
                            self.chunk_state = ChunkState::Size;
                        }
                        Some(_) => return self.fail(400),
                        None => return self.need_more(),
                    }
                }
                ChunkState::Trailer => {
                    if self.buf.get(self.cursor..self.cursor + 2) == Some(&b"\r\n"[..]) {
                        self.cursor += 2;
                    } else if let Some(i) = find_seq(&self.buf, b"\r\n\r\n", self.cursor) {
                        self.cursor = i + 4;
                    } else {
                        return self.need_more();
                    }
                    self.position = Position::Complete;
                    return None;
                }
            }
        }
    }
}

fn parse_version(token: &str) -> Option<(u8, u8)> {
    let rest = token.strip_prefix("HTTP/")?;
    let (major, minor) = rest.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

fn find_seq(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn trim_bytes(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

/// Splits a header block into its CRLF-terminated lines.
trait SplitCrlfLines {
    fn split_crlf_lines(&self) -> SplitCrlfIter<'_>;
}

impl SplitCrlfLines for [u8] {
    fn split_crlf_lines(&self) -> SplitCrlfIter<'_> {
        SplitCrlfIter { rest: self }
    }
}

struct SplitCrlfIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for SplitCrlfIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }
        match find_seq(self.rest, b"\r\n", 0) {
            Some(i) => {
                let line = &self.rest[..i];
                self.rest = &self.rest[i + 2..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = &[];
                Some(line)
            }
        }
    }
}
