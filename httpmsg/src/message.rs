use crate::header::HeaderMap;
use crate::method::HttpMethod;
use crate::uri::Uri;

/// A parsed HTTP message, request or response.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HttpMessage {
    /// True for requests, false for responses.
    pub is_request: bool,
    /// Method of a request; `Unknown` on responses.
    pub method: HttpMethod,
    /// For responses: the method of the request being answered. Set from
    /// the parser's response hint, never from the wire.
    pub request_method: HttpMethod,
    /// Request uri; default (empty relative) on responses.
    pub uri: Uri,
    /// Status code of a response; 0 on requests.
    pub status_code: u16,
    /// Reason phrase of a response.
    pub status_msg: String,
    pub major_version: u8,
    pub minor_version: u8,
    pub headers: HeaderMap,
    /// Message body, already de-chunked where applicable.
    pub entity: Vec<u8>,
}

impl HttpMessage {
    pub(crate) fn new_request() -> Self {
        HttpMessage {
            is_request: true,
            major_version: 1,
            minor_version: 1,
            ..Default::default()
        }
    }

    pub(crate) fn new_response(request_method: HttpMethod) -> Self {
        HttpMessage {
            is_request: false,
            request_method,
            major_version: 1,
            minor_version: 1,
            ..Default::default()
        }
    }
}
