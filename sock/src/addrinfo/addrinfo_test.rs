use super::*;

fn flags(passive: bool, numeric_host: bool, numeric_service: bool) -> ResolveFlags {
    ResolveFlags {
        passive,
        numeric_host,
        numeric_service,
    }
}

#[test]
fn test_resolve_numeric_v4() -> Result<()> {
    let addr = resolve(
        "192.168.1.2",
        "50080",
        Some(AddressFamily::Ipv4),
        SocketKind::Stream,
        ResolveFlags::default(),
    )?;
    assert_eq!("192.168.1.2:50080", addr.to_string());
    Ok(())
}

#[test]
fn test_resolve_numeric_v6_bracketed() -> Result<()> {
    let addr = resolve(
        "[2001:db8::ab]",
        "443",
        Some(AddressFamily::Ipv6),
        SocketKind::Stream,
        ResolveFlags::default(),
    )?;
    assert_eq!("[2001:db8::ab]:443", addr.to_string());
    Ok(())
}

#[test]
fn test_resolve_numeric_v6_unbracketed_fails() {
    let result = resolve(
        "2001:db8::ab",
        "443",
        Some(AddressFamily::Ipv6),
        SocketKind::Stream,
        ResolveFlags::default(),
    );
    assert_eq!(Err(Error::ErrNameResolution), result);
}

#[test]
fn test_resolve_empty_node_passive_is_wildcard() -> Result<()> {
    let addr = resolve(
        "",
        "1900",
        Some(AddressFamily::Ipv6),
        SocketKind::Datagram,
        flags(true, false, false),
    )?;
    assert_eq!("[::]:1900", addr.to_string());

    let addr = resolve(
        "",
        "1900",
        Some(AddressFamily::Ipv4),
        SocketKind::Datagram,
        flags(true, false, false),
    )?;
    assert_eq!("0.0.0.0:1900", addr.to_string());
    Ok(())
}

#[test]
fn test_resolve_empty_node_is_loopback() -> Result<()> {
    let addr = resolve(
        "",
        "80",
        Some(AddressFamily::Ipv6),
        SocketKind::Stream,
        ResolveFlags::default(),
    )?;
    assert_eq!("[::1]:80", addr.to_string());

    let addr = resolve(
        "",
        "80",
        Some(AddressFamily::Ipv4),
        SocketKind::Stream,
        ResolveFlags::default(),
    )?;
    assert_eq!("127.0.0.1:80", addr.to_string());
    Ok(())
}

#[test]
fn test_resolve_passive_ignored_for_node() -> Result<()> {
    let addr = resolve(
        "127.0.0.1",
        "80",
        Some(AddressFamily::Ipv4),
        SocketKind::Stream,
        flags(true, false, false),
    )?;
    assert_eq!("127.0.0.1:80", addr.to_string());
    Ok(())
}

#[test]
fn test_resolve_numeric_host_rejects_names() {
    let result = resolve(
        "localhost",
        "80",
        Some(AddressFamily::Ipv4),
        SocketKind::Stream,
        flags(false, true, false),
    );
    assert_eq!(Err(Error::ErrNameResolution), result);
}

#[test]
fn test_resolve_family_mismatch() {
    let result = resolve(
        "192.168.1.2",
        "80",
        Some(AddressFamily::Ipv6),
        SocketKind::Stream,
        ResolveFlags::default(),
    );
    assert_eq!(Err(Error::ErrWrongFamily), result);
}

#[test]
fn test_resolve_service_names() -> Result<()> {
    let addr = resolve(
        "127.0.0.1",
        "ssdp",
        Some(AddressFamily::Ipv4),
        SocketKind::Datagram,
        ResolveFlags::default(),
    )?;
    assert_eq!(1900, addr.port());

    let result = resolve(
        "127.0.0.1",
        "ssdp",
        Some(AddressFamily::Ipv4),
        SocketKind::Datagram,
        flags(false, false, true),
    );
    assert_eq!(Err(Error::ErrNameResolution), result);
    Ok(())
}

#[test]
fn test_resolve_empty_service_is_port_zero() -> Result<()> {
    let addr = resolve(
        "127.0.0.1",
        "",
        Some(AddressFamily::Ipv4),
        SocketKind::Stream,
        ResolveFlags::default(),
    )?;
    assert_eq!(0, addr.port());
    Ok(())
}
