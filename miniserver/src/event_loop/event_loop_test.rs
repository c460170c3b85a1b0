use super::*;

fn from_localhost() -> SocketAddr {
    "127.0.0.1:54321".parse().unwrap()
}

#[test]
fn test_stop_datagram_exact_match() {
    assert!(is_stop_datagram(b"ShutDown\0", from_localhost()));
}

#[test]
fn test_stop_datagram_requires_loopback_peer() {
    let remote: SocketAddr = "192.0.2.1:54321".parse().unwrap();
    assert!(!is_stop_datagram(b"ShutDown\0", remote));

    // Loopback-range-but-not-127.0.0.1 peers are rejected too.
    let other_loopback: SocketAddr = "127.0.0.2:54321".parse().unwrap();
    assert!(!is_stop_datagram(b"ShutDown\0", other_loopback));
}

#[test]
fn test_stop_datagram_requires_trailing_nul() {
    assert!(!is_stop_datagram(b"ShutDown", from_localhost()));
}

#[test]
fn test_stop_datagram_rejects_short_or_long_payloads() {
    assert!(!is_stop_datagram(b"", from_localhost()));
    assert!(!is_stop_datagram(b"Shut", from_localhost()));
    assert!(!is_stop_datagram(b"ShutDown\0X", from_localhost()));
    assert!(!is_stop_datagram(b"SHUTDOWN\0", from_localhost()));
}
