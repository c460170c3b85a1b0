use super::*;
use crate::uri::UriType;

#[test]
fn test_parse_simple_get() {
    let mut p = Parser::for_request();
    let status = p.parse(b"GET /desc.xml HTTP/1.1\r\nHost: 192.168.1.2:49152\r\n\r\n");
    assert_eq!(ParseStatus::Success, status);

    let msg = p.message();
    assert!(msg.is_request);
    assert_eq!(HttpMethod::Get, msg.method);
    assert_eq!(UriType::Relative, msg.uri.kind);
    assert_eq!("/desc.xml", msg.uri.path_query);
    assert_eq!((1, 1), (msg.major_version, msg.minor_version));
    assert_eq!(Some("192.168.1.2:49152"), msg.headers.find_text(HeaderId::Host));
    assert!(msg.entity.is_empty());
}

#[test]
fn test_parse_incremental_byte_by_byte() {
    let wire = b"SUBSCRIBE /evt HTTP/1.1\r\nHost: 10.0.0.1\r\nNT: upnp:event\r\nCallback: <http://10.0.0.2/cb>\r\nTimeout: Second-1800\r\n\r\n";
    let mut p = Parser::for_request();
    let mut status = ParseStatus::Incomplete;
    for b in wire.iter() {
        status = p.parse(std::slice::from_ref(b));
    }
    assert_eq!(ParseStatus::Success, status);
    let msg = p.message();
    assert_eq!(HttpMethod::Subscribe, msg.method);
    assert_eq!(Some("upnp:event"), msg.headers.find_text(HeaderId::Nt));
    assert_eq!(Some("Second-1800"), msg.headers.find_text(HeaderId::Timeout));
}

#[test]
fn test_parse_post_with_content_length() {
    let mut p = Parser::for_request();
    let mut status = p.parse(b"POST /ctrl HTTP/1.1\r\nHost: h\r\nContent-Length: 11\r\n\r\nhello");
    assert_eq!(ParseStatus::Incomplete, status);
    status = p.parse(b" world");
    assert_eq!(ParseStatus::Success, status);
    assert_eq!(b"hello world", p.message().entity.as_slice());
}

#[test]
fn test_parse_chunked_entity() {
    let mut p = Parser::for_request();
    let status = p.parse(
        b"POST /ctrl HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n\
          5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
    );
    assert_eq!(ParseStatus::Success, status);
    assert_eq!(b"hello world", p.message().entity.as_slice());
}

#[test]
fn test_parse_chunked_split_across_feeds() {
    let mut p = Parser::for_request();
    assert_eq!(
        ParseStatus::Incomplete,
        p.parse(b"POST / HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhe")
    );
    assert_eq!(ParseStatus::Incomplete, p.parse(b"llo\r\n"));
    assert_eq!(ParseStatus::Success, p.parse(b"0\r\n\r\n"));
    assert_eq!(b"hello", p.message().entity.as_slice());
}

#[test]
fn test_notify_without_content_length_sets_hack() {
    let mut p = Parser::for_request();
    let status = p.parse(
        b"NOTIFY * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nNT: upnp:rootdevice\r\nNTS: ssdp:alive\r\n\r\n",
    );
    assert_eq!(ParseStatus::Failure(411), status);
    assert!(p.valid_ssdp_notify_hack());
    assert_eq!(411, p.http_error_code());
    // The message itself is still usable for the SSDP path.
    assert_eq!(HttpMethod::Notify, p.message().method);
    assert!(p.message().uri.is_asterisk());
}

#[test]
fn test_post_without_content_length_fails_411() {
    let mut p = Parser::for_request();
    let status = p.parse(b"POST /ctrl HTTP/1.1\r\nHost: h\r\n\r\n");
    assert_eq!(ParseStatus::Failure(411), status);
    assert!(!p.valid_ssdp_notify_hack());
}

#[test]
fn test_unknown_method_fails_501() {
    let mut p = Parser::for_request();
    let status = p.parse(b"CONNECT example.com:443 HTTP/1.1\r\n\r\n");
    assert_eq!(ParseStatus::Failure(501), status);
}

#[test]
fn test_malformed_request_line_fails_400() {
    let mut p = Parser::for_request();
    assert_eq!(ParseStatus::Failure(400), p.parse(b"GET /\r\n\r\n"));

    let mut p = Parser::for_request();
    assert_eq!(
        ParseStatus::Failure(400),
        p.parse(b"GET / HTTQ/1.1\r\n\r\n")
    );

    let mut p = Parser::for_request();
    assert_eq!(
        ParseStatus::Failure(400),
        p.parse(b"GET relative-no-slash HTTP/1.1\r\n\r\n")
    );
}

#[test]
fn test_malformed_header_fails_400() {
    let mut p = Parser::for_request();
    assert_eq!(
        ParseStatus::Failure(400),
        p.parse(b"GET / HTTP/1.1\r\nno colon here\r\n\r\n")
    );
}

#[test]
fn test_failure_is_sticky() {
    let mut p = Parser::for_request();
    assert_eq!(ParseStatus::Failure(400), p.parse(b"bogus\r\n"));
    assert_eq!(ParseStatus::Failure(400), p.parse(b"GET / HTTP/1.1\r\n\r\n"));
}

#[test]
fn test_header_continuation_line() {
    let mut p = Parser::for_request();
    let status = p.parse(b"GET / HTTP/1.1\r\nHost: h\r\nX-Long: first\r\n second\r\n\r\n");
    assert_eq!(ParseStatus::Success, status);
    assert_eq!(
        Some(&b"first second"[..]),
        p.message().headers.find_name("X-Long")
    );
}

#[test]
fn test_parse_msearch_request() {
    let mut p = Parser::for_request();
    let status = p.parse(
        b"M-SEARCH * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nMAN: \"ssdp:discover\"\r\nMX: 1\r\nST: ssdp:all\r\n\r\n",
    );
    assert_eq!(ParseStatus::Success, status);
    let msg = p.message();
    assert_eq!(HttpMethod::MSearch, msg.method);
    assert!(msg.uri.is_asterisk());
    assert_eq!(Some("\"ssdp:discover\""), msg.headers.find_text(HeaderId::Man));
    assert_eq!(Some("ssdp:all"), msg.headers.find_text(HeaderId::St));
}

#[test]
fn test_parse_response_with_content_length() {
    let mut p = Parser::for_response(HttpMethod::Get);
    let status = p.parse(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
    assert_eq!(ParseStatus::Success, status);
    let msg = p.message();
    assert!(!msg.is_request);
    assert_eq!(200, msg.status_code);
    assert_eq!("OK", msg.status_msg);
    assert_eq!(HttpMethod::Get, msg.request_method);
    assert_eq!(b"ok", msg.entity.as_slice());
}

#[test]
fn test_parse_msearch_response_completes_on_finish() {
    // SSDP search replies carry no Content-Length; the datagram boundary
    // ends the message.
    let mut p = Parser::for_response(HttpMethod::MSearch);
    let status = p.parse(
        b"HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=1800\r\nST: upnp:rootdevice\r\nUSN: uuid:1\r\n\r\n",
    );
    assert_eq!(ParseStatus::Incomplete, status);
    assert_eq!(ParseStatus::Success, p.finish());
    let msg = p.message();
    assert_eq!(200, msg.status_code);
    assert_eq!(HttpMethod::MSearch, msg.request_method);
    assert_eq!(Some("upnp:rootdevice"), msg.headers.find_text(HeaderId::St));
}

#[test]
fn test_response_without_entity_codes() {
    let mut p = Parser::for_response(HttpMethod::Get);
    assert_eq!(ParseStatus::Success, p.parse(b"HTTP/1.1 204 No Content\r\n\r\n"));

    let mut p = Parser::for_response(HttpMethod::Head);
    assert_eq!(
        ParseStatus::Success,
        p.parse(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n")
    );
}

#[test]
fn test_truncated_message_fails_on_finish() {
    let mut p = Parser::for_request();
    assert_eq!(
        ParseStatus::Incomplete,
        p.parse(b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 10\r\n\r\nabc")
    );
    assert_eq!(ParseStatus::Failure(400), p.finish());
}

#[test]
fn test_bad_content_length_fails_400() {
    let mut p = Parser::for_request();
    assert_eq!(
        ParseStatus::Failure(400),
        p.parse(b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: ten\r\n\r\n")
    );
}

#[test]
fn test_response_head_status_only() {
    let mut p = Parser::for_response(HttpMethod::MSearch);
    // A reason phrase is optional.
    assert_eq!(ParseStatus::Incomplete, p.parse(b"HTTP/1.1 200\r\n\r\n"));
    assert_eq!(ParseStatus::Success, p.finish());
    assert_eq!(200, p.message().status_code);
    assert_eq!("", p.message().status_msg);
}

#[test]
fn test_into_message() {
    let mut p = Parser::for_request();
    assert_eq!(
        ParseStatus::Success,
        p.parse(b"GET / HTTP/1.1\r\nHost: h\r\n\r\n")
    );
    let msg = p.into_message();
    assert_eq!(HttpMethod::Get, msg.method);
}
