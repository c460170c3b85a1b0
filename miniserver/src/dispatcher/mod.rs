
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;

use httpmsg::{status_text, HeaderId, HttpMessage, HttpMethod, ParseStatus, Parser};
use sock::netaddr::to_netaddrp;

use crate::config::{Connection, Shared};
use crate::error::Error;

const READ_BUF_SIZE: usize = 4096;

/// Outcome of the routing/validation stage: either a handler ran, or an
/// HTTP status code must be answered.
type DispatchResult = std::result::Result<(), u16>;

/// Receives one request from an accepted connection and dispatches it.
///
/// Runs as one spawned job per connection. Exactly one of {callback
/// invoked, status response sent, silent close} happens, and the socket is
/// shut down before the job returns.
pub(crate) async fn handle_request(stream: TcpStream, peer: SocketAddr, shared: Arc<Shared>) {
    log::info!("miniserver: reading request from {peer}...");

    let mut conn = Connection { stream, peer };
    let mut parser = Parser::for_request();
    let mut buf = [0u8; READ_BUF_SIZE];

    let msg = loop {
        let n = match conn.recv(&mut buf).await {
            Err(Error::ErrTimeout) => {
                log::warn!("miniserver: request from {peer} timed out");
                send_status_response(&mut conn, 408, parser.message()).await;
                return shutdown(conn).await;
            }
            Err(e) => {
                log::warn!("miniserver: read error from {peer}: {e}");
                return shutdown(conn).await;
            }
            Ok(n) => n,
        };
        let status = if n == 0 {
            parser.finish()
        } else {
            parser.parse(&buf[..n])
        };
        match status {
            ParseStatus::Success => break parser.into_message(),
            ParseStatus::Incomplete => continue,
            ParseStatus::Failure(code) => {
                log::info!("miniserver: bad request from {peer}, code {code}");
                send_status_response(&mut conn, code, parser.message()).await;
                return shutdown(conn).await;
            }
        }
    };

    log::info!("miniserver: processing {} {} from {peer}", msg.method, msg.uri);
    if let Err(code) = dispatch_request(&msg, &mut conn, &shared).await {
        send_status_response(&mut conn, code, &msg).await;
    }
    shutdown(conn).await;
    log::info!("miniserver: request from {peer} complete");
}

/// Routes the parsed message to the registered callback after the
/// DNS-rebind defense.
async fn dispatch_request(msg: &HttpMessage, conn: &mut Connection, shared: &Shared) -> DispatchResult {
    let callbacks = shared.callbacks.load_full();
    let callbacks = callbacks.as_deref();

    let mut host_validator = None;
    let callback = match msg.method {
        // Soap call: M-POST, or a POST carrying a SOAPACTION header. A
        // plain POST without one belongs to the web server.
        HttpMethod::SoapPost | HttpMethod::MPost => {
            log::info!("miniserver: got SOAP msg from {}", conn.peer);
            callbacks.and_then(|c| c.soap.clone())
        }
        HttpMethod::Post if msg.headers.find(HeaderId::SoapAction).is_some() => {
            log::info!("miniserver: got SOAP msg from {}", conn.peer);
            callbacks.and_then(|c| c.soap.clone())
        }
        // Gena call
        HttpMethod::Notify | HttpMethod::Subscribe | HttpMethod::Unsubscribe => {
            log::info!("miniserver: got GENA msg from {}", conn.peer);
            callbacks.and_then(|c| c.gena.clone())
        }
        // Web server call
        HttpMethod::Get | HttpMethod::Post | HttpMethod::Head | HttpMethod::SimpleGet => {
            log::info!("miniserver: got web server msg from {}", conn.peer);
            host_validator = callbacks.and_then(|c| c.host_validator.clone());
            callbacks.and_then(|c| c.web.clone())
        }
        _ => None,
    };
    let Some(callback) = callback else {
        return Err(500);
    };

    // Check the HOST header for an ip number; prevents DNS rebinding.
    let Some(host) = msg.headers.find_text(HeaderId::Host) else {
        log::info!("miniserver: request without Host header rejected");
        return Err(400);
    };
    if let Some(validator) = host_validator {
        if !validator.validate(host) {
            return Err(400);
        }
    } else if !host_header_is_numeric(host) {
        if !shared.config.allow_literal_host_redirection {
            log::info!("miniserver: possible DNS rebind attack prevented");
            return Err(400);
        }
        let Some(host_port) = numeric_host_redirection(&conn.stream) else {
            return Err(400);
        };
        let redirect = format!(
            "HTTP/1.1 307 Temporary Redirect\r\nLocation: http://{host_port}\r\n\r\n"
        );
        log::info!("miniserver: redirecting {} to {host_port}", conn.peer);
        if send_if_writable(conn, redirect.as_bytes()).await.is_err() {
            log::warn!("miniserver: failed to send redirect to {}", conn.peer);
        }
        return Ok(());
    }

    callback.handle(msg, conn).await;
    Ok(())
}

/// Check if a Host header value is a numeric network address.
///
/// An empty value or an unspecified one (`[::]`, `0.0.0.0`) is not valid.
pub(crate) fn host_header_is_numeric(host_port: &str) -> bool {
    if host_port.is_empty() || host_port.starts_with("[::]") || host_port.starts_with("0.0.0.0") {
        return false;
    }
    let host = match host_port.rfind(':') {
        // "[v6]:port" or "v4:port"; a bare "[v6]" keeps everything.
        Some(idx) if !host_port[idx..].contains(']') => &host_port[..idx],
        _ => host_port,
    };
    if let Some(inner) = host.strip_prefix('[') {
        return matches!(
            inner.strip_suffix(']').map(str::parse::<std::net::Ipv6Addr>),
            Some(Ok(_))
        );
    }
    host.parse::<std::net::Ipv4Addr>().is_ok()
}

/// The numeric host:port bound to the accepted socket, for the redirect
/// Location.
fn numeric_host_redirection(stream: &TcpStream) -> Option<String> {
    match stream.local_addr() {
        Ok(addr) => Some(to_netaddrp(&addr)),
        Err(e) => {
            log::error!("miniserver: getsockname on accepted socket failed: {e}");
            None
        }
    }
}

/// Answers a status code using the request's HTTP version.
///
/// The response is only attempted while the send side of the socket is
/// still open; a connection already torn down is closed silently.
async fn send_status_response(conn: &mut Connection, code: u16, msg: &HttpMessage) {
    let (major, minor) = match (msg.major_version, msg.minor_version) {
        (0, 0) => (1, 1),
        v => v,
    };
    let response = format!(
        "HTTP/{major}.{minor} {code} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status_text(code)
    );
    if send_if_writable(conn, response.as_bytes()).await.is_err() {
        log::info!("miniserver: status {code} to {} not sent, socket closed", conn.peer);
    }
}

async fn send_if_writable(conn: &mut Connection, buf: &[u8]) -> crate::Result<()> {
    if !send_side_open(&conn.stream) {
        return Err(Error::ErrNotConnected);
    }
    conn.send(buf).await
}

/// Zero-byte write probe: true while the send side has not reported an
/// error.
fn send_side_open(stream: &TcpStream) -> bool {
    match stream.try_write(&[]) {
        Ok(_) => true,
        Err(e) => e.kind() == io::ErrorKind::WouldBlock,
    }
}

async fn shutdown(mut conn: Connection) {
    use tokio::io::AsyncWriteExt;
    let _ = conn.stream.shutdown().await;
}
