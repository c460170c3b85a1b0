#[cfg(test)]
mod addrinfo_test;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};

use crate::error::*;
use crate::socket::{AddressFamily, SocketKind};

/// Resolution flags, modelled after the getaddrinfo() AI_* subset the
/// stack actually uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveFlags {
    /// The returned address is intended for bind(): an empty node yields
    /// the wildcard address instead of loopback.
    pub passive: bool,
    /// The node must be a numeric literal; no name lookup is performed.
    pub numeric_host: bool,
    /// The service must be a numeric port; no service-name lookup is
    /// performed.
    pub numeric_service: bool,
}

/// Well known service names the stack resolves without consulting the
/// system services database.
const SERVICE_TABLE: [(&str, u16); 3] = [("http", 80), ("https", 443), ("ssdp", 1900)];

/// Resolves a (node, service) pair to the first socket address compatible
/// with the requested family.
///
/// Resolution is numeric-first: dotted-quad IPv4 and bracketed IPv6
/// literals never hit the resolver library. An unbracketed IPv6 literal is
/// rejected. An empty node yields the wildcard address with
/// `flags.passive`, the loopback address otherwise.
pub fn resolve(
    node: &str,
    service: &str,
    family: Option<AddressFamily>,
    kind: SocketKind,
    flags: ResolveFlags,
) -> Result<SocketAddr> {
    let port = resolve_service(service, flags)?;

    if node.is_empty() {
        let fam = family.unwrap_or(AddressFamily::Ipv4);
        let ip: IpAddr = match (fam, flags.passive) {
            (AddressFamily::Ipv4, true) => Ipv4Addr::UNSPECIFIED.into(),
            (AddressFamily::Ipv4, false) => Ipv4Addr::LOCALHOST.into(),
            (AddressFamily::Ipv6, true) => Ipv6Addr::UNSPECIFIED.into(),
            (AddressFamily::Ipv6, false) => Ipv6Addr::LOCALHOST.into(),
        };
        return Ok(SocketAddr::new(ip, port));
    }

    // Numeric node. Passive is ignored for a non-empty node.
    if let Some(ip) = parse_numeric(node)? {
        let addr = SocketAddr::new(ip, port);
        check_family(&addr, family)?;
        return Ok(addr);
    }
    if flags.numeric_host {
        return Err(Error::ErrNameResolution);
    }

    // Symbolic node, resolver library does the lookup.
    log::debug!("addrinfo: looking up node={node} service={port} kind={kind}");
    let candidates = (node, port)
        .to_socket_addrs()
        .map_err(|_| Error::ErrNameResolution)?;
    for addr in candidates {
        if check_family(&addr, family).is_ok() {
            return Ok(addr);
        }
    }
    Err(Error::ErrNameResolution)
}

/// Parses a numeric node or reports `None` for symbolic names.
///
/// IPv6 literals must be bracketed; a bare hex-colon literal is an error,
/// not a symbolic name.
fn parse_numeric(node: &str) -> Result<Option<IpAddr>> {
    if let Some(inner) = node.strip_prefix('[') {
        let inner = inner.strip_suffix(']').ok_or(Error::ErrNameResolution)?;
        let ip: Ipv6Addr = inner.parse().map_err(|_| Error::ErrNameResolution)?;
        return Ok(Some(ip.into()));
    }
    if node.contains(':') {
        // Unbracketed IPv6 literal.
        return Err(Error::ErrNameResolution);
    }
    Ok(node.parse::<Ipv4Addr>().ok().map(IpAddr::from))
}

fn resolve_service(service: &str, flags: ResolveFlags) -> Result<u16> {
    if service.is_empty() {
        return Ok(0);
    }
    if let Ok(port) = service.parse::<u16>() {
        return Ok(port);
    }
    if flags.numeric_service {
        return Err(Error::ErrNameResolution);
    }
    SERVICE_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(service))
        .map(|&(_, port)| port)
        .ok_or(Error::ErrNameResolution)
}

fn check_family(addr: &SocketAddr, family: Option<AddressFamily>) -> Result<()> {
    match family {
        Some(AddressFamily::Ipv4) if !addr.is_ipv4() => Err(Error::ErrWrongFamily),
        Some(AddressFamily::Ipv6) if !addr.is_ipv6() => Err(Error::ErrWrongFamily),
        _ => Ok(()),
    }
}
