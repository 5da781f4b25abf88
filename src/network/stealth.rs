//! Half-open (SYN) connect probe
//!
//! Sends a hand-built SYN at the target and classifies the first reply
//! addressed back to it, without ever completing the three-way
//! handshake. The peer is left with at most a half-open entry its own
//! stack resets or expires, and middleboxes that only track completed
//! handshakes see nothing. A destination that silently drops instead of
//! resetting shows up as a timeout.

use crate::network::blocking::set_blocking;
use crate::network::packet::{self, SynSegment, TCP_HEADER_LEN};
use crate::network::poller::{self, Interest, Readiness};
use crate::network::resolve::source_addr_for;
use crate::network::socket::RawSocket;
use crate::network::token::TokenGenerator;
use crate::network::ProbeOutcome;
use crate::{ProbeError, Result};
use log::{debug, trace};
use std::io;
use std::net::SocketAddrV4;
use std::time::{Duration, Instant};

/// Largest datagram the raw socket can hand back: a maximal IP packet
const RECV_BUF_LEN: usize = 65535;

/// Probe `target` by sending a single raw SYN and classifying the
/// reply.
///
/// Requires the privilege to open a raw IPPROTO_TCP socket. `timeout_ms`
/// must not be 0; negative waits indefinitely for the reply. A reply
/// with SYN set means the port is open (`Connected`); a reply without it
/// (typically RST) means it is closed (`ConnectFailed` with
/// ECONNREFUSED); silence for the whole budget means dropped or
/// filtered (`TimedOut`).
pub fn half_open_probe(
    tokens: &TokenGenerator,
    target: SocketAddrV4,
    timeout_ms: i32,
    window: u16,
) -> Result<ProbeOutcome> {
    if timeout_ms == 0 {
        return Err(ProbeError::ZeroTimeout);
    }

    let token = tokens.next();
    let source_ip = source_addr_for(target)?;
    let segment = SynSegment::build(source_ip, *target.ip(), token, target.port(), window);

    let socket = RawSocket::new_tcp()?;
    set_blocking(&socket, false)?;

    debug!(
        "SYN probe {} -> {} (token {:#06x})",
        source_ip, target, token
    );

    let sent = socket.send_to(segment.as_bytes(), target)?;
    if sent != TCP_HEADER_LEN {
        return Err(ProbeError::SendError(format!(
            "short send: {} of {} bytes",
            sent, TCP_HEADER_LEN
        )));
    }

    let deadline = (timeout_ms > 0)
        .then(|| Instant::now() + Duration::from_millis(timeout_ms as u64));
    let mut buf = [0u8; RECV_BUF_LEN];

    // the raw socket sees every inbound TCP segment on the host, so
    // keep receiving until one is addressed back to our token or the
    // budget runs out
    loop {
        let remaining = match deadline {
            None => timeout_ms,
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return Ok(ProbeOutcome::TimedOut);
                }
                left.as_millis() as i32
            }
        };

        match poller::wait_ready(&socket, Interest::Readable, remaining)? {
            Readiness::NotReady => return Ok(ProbeOutcome::TimedOut),
            Readiness::Ready => {}
        }

        let size = match socket.recv(&mut buf) {
            Ok(size) => size,
            Err(e)
                if e.kind() == io::ErrorKind::Interrupted
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                continue
            }
            Err(e) => return Err(ProbeError::RecvError(e.to_string())),
        };

        let reply = match packet::parse_tcp_reply(&buf[..size]) {
            Some(reply) => reply,
            None => continue,
        };
        if reply.dest_port != token {
            trace!("skipping unrelated segment for port {}", reply.dest_port);
            continue;
        }

        // The handshake is abandoned right here: no ACK goes out, the
        // peer's stack resets or expires the half-open entry on its
        // own.
        return if reply.is_syn() {
            Ok(ProbeOutcome::Connected)
        } else {
            // no SYN in the reply, typically a RST: refused
            Ok(ProbeOutcome::ConnectFailed {
                errno: libc::ECONNREFUSED,
            })
        };
    }
}
