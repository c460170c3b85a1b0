use super::*;

#[test]
fn test_new_socket_is_unbound() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Stream)?;
    assert!(!s.is_bound());
    assert!(!s.is_listening());
    assert_eq!(AddressFamily::Ipv4, s.family());
    assert_eq!(SocketKind::Stream, s.kind());
    Ok(())
}

#[test]
fn test_bind_loopback_ephemeral() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Stream)?;
    s.bind("127.0.0.1", "0", ResolveFlags::default())?;
    assert!(s.is_bound());
    assert!(s.port()? > 0);
    assert_eq!("127.0.0.1", s.netaddr()?);
    assert_eq!(format!("127.0.0.1:{}", s.port()?), s.netaddrp()?);
    Ok(())
}

#[test]
fn test_bind_twice_fails() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Stream)?;
    s.bind("127.0.0.1", "0", ResolveFlags::default())?;
    let result = s.bind("127.0.0.1", "0", ResolveFlags::default());
    assert_eq!(Err(Error::ErrAlreadyBound), result);
    Ok(())
}

#[test]
fn test_bind_wrong_family() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv6, SocketKind::Stream)?;
    let result = s.bind("127.0.0.1", "0", ResolveFlags::default());
    assert_eq!(Err(Error::ErrWrongFamily), result);

    let addr = "127.0.0.1:0".parse().unwrap();
    assert_eq!(Err(Error::ErrWrongFamily), s.bind_addr(addr));
    Ok(())
}

#[test]
fn test_bind_passive_empty_node_is_wildcard() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv6, SocketKind::Stream)?;
    s.bind(
        "",
        "0",
        ResolveFlags {
            passive: true,
            ..Default::default()
        },
    )?;
    let addr = s.local_addr()?;
    assert!(addr.ip().is_unspecified());
    assert!(addr.port() > 0);
    // A bound wildcard socket with a real port counts as bound.
    assert!(s.is_bound());
    Ok(())
}

#[test]
fn test_bind_empty_node_without_passive_is_loopback() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv6, SocketKind::Stream)?;
    s.bind("", "0", ResolveFlags::default())?;
    assert_eq!("[::1]", s.netaddr()?);
    Ok(())
}

#[test]
fn test_listen_stream() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Stream)?;
    s.bind("127.0.0.1", "0", ResolveFlags::default())?;
    s.listen()?;
    assert!(s.is_listening());
    // Idempotent.
    s.listen()?;
    Ok(())
}

#[test]
fn test_listen_datagram_fails() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Datagram)?;
    s.bind("127.0.0.1", "0", ResolveFlags::default())?;
    assert_eq!(Err(Error::ErrWrongKind), s.listen());
    Ok(())
}

#[test]
fn test_v6only_observed_after_stream_bind() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv6, SocketKind::Stream)?;
    s.set_v6only(false)?;
    s.bind("[::1]", "0", ResolveFlags::default())?;
    assert!(s.is_v6only()?);
    // Mutation after bind is a silent no-op.
    s.set_v6only(false)?;
    assert!(s.is_v6only()?);
    Ok(())
}

#[test]
fn test_v6only_ignored_on_v4() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Stream)?;
    s.set_v6only(true)?;
    assert!(!s.is_v6only()?);
    Ok(())
}

#[tokio::test]
async fn test_into_tokio_types() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Stream)?;
    s.bind("127.0.0.1", "0", ResolveFlags::default())?;
    s.listen()?;
    let port = s.port()?;
    let listener = s.into_tcp_listener()?;
    assert_eq!(port, listener.local_addr().map_err(Error::from)?.port());

    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Datagram)?;
    s.bind("127.0.0.1", "0", ResolveFlags::default())?;
    let udp = s.into_udp_socket()?;
    assert!(udp.local_addr().map_err(Error::from)?.port() > 0);
    Ok(())
}

#[tokio::test]
async fn test_into_tcp_listener_wrong_kind() -> Result<()> {
    let s = Socket::new(AddressFamily::Ipv4, SocketKind::Datagram)?;
    s.bind("127.0.0.1", "0", ResolveFlags::default())?;
    assert!(matches!(s.into_tcp_listener(), Err(Error::ErrWrongKind)));
    Ok(())
}
