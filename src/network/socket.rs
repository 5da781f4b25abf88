//! Raw socket management

use crate::{ProbeError, Result};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::mem::MaybeUninit;
use std::net::SocketAddrV4;
use std::os::unix::io::{AsRawFd, RawFd};

/// Raw IPPROTO_TCP socket for sending crafted segments and receiving
/// the replies. The kernel prepends the IP header on send and delivers
/// whole IP datagrams on receive. Closed on drop, which covers every
/// exit path of a probe.
pub struct RawSocket {
    socket: Socket,
}

impl RawSocket {
    /// Create a new raw TCP socket. Requires privilege (CAP_NET_RAW or
    /// root); a denial is surfaced as `PermissionError`, never silently
    /// downgraded to another strategy.
    pub fn new_tcp() -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::from(libc::SOCK_RAW), Some(Protocol::TCP))
            .map_err(|e| {
                if e.kind() == io::ErrorKind::PermissionDenied {
                    ProbeError::PermissionError("raw socket creation denied".to_string())
                } else {
                    ProbeError::RawSocketError(e.to_string())
                }
            })?;

        Ok(Self { socket })
    }

    /// Send `packet` to `dest`, returning the number of bytes accepted
    pub fn send_to(&self, packet: &[u8], dest: SocketAddrV4) -> Result<usize> {
        self.socket
            .send_to(packet, &SockAddr::from(dest))
            .map_err(|e| ProbeError::SendError(e.to_string()))
    }

    /// Receive one datagram into `buf`.
    ///
    /// Errors come back raw so the caller can decide which kinds
    /// (Interrupted, WouldBlock) merit another readiness wait instead of
    /// aborting the probe.
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut uninit: Vec<MaybeUninit<u8>> = vec![MaybeUninit::uninit(); buf.len()];
        let (size, _addr) = self.socket.recv_from(&mut uninit)?;

        let size = size.min(buf.len());
        for i in 0..size {
            buf[i] = unsafe { uninit[i].assume_init() };
        }
        Ok(size)
    }
}

impl AsRawFd for RawSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
