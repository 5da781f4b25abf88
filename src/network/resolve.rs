//! Target and source address resolution

use crate::{ProbeError, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};

/// Resolve `host` to its first IPv4 address.
///
/// `host` may already be a dotted quad, in which case nothing is looked
/// up beyond parsing it. Names that resolve only to IPv6 addresses are
/// rejected.
pub fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddrV4> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| ProbeError::InvalidTarget(format!("{}: {}", host, e)))?;

    for addr in addrs {
        if let SocketAddr::V4(v4) = addr {
            return Ok(v4);
        }
    }
    Err(ProbeError::InvalidTarget(format!(
        "{}: no IPv4 address",
        host
    )))
}

/// Determine the local source address the kernel would use to reach
/// `target`.
///
/// A throwaway UDP socket is connected to the target and its local name
/// read back; connecting a datagram socket only runs the route lookup,
/// no packet leaves the host.
pub fn source_addr_for(target: SocketAddrV4) -> Result<Ipv4Addr> {
    let socket =
        UdpSocket::bind("0.0.0.0:0").map_err(|e| ProbeError::SourceAddress(e.to_string()))?;
    socket
        .connect(target)
        .map_err(|e| ProbeError::SourceAddress(e.to_string()))?;

    let local_addr = socket
        .local_addr()
        .map_err(|e| ProbeError::SourceAddress(e.to_string()))?;
    match local_addr.ip() {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(_) => Err(ProbeError::SourceAddress(
            "kernel selected an IPv6 source".to_string(),
        )),
    }
}
