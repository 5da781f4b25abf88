//! Timeout-bounded TCP connect

use crate::network::blocking::set_blocking;
use crate::network::poller::{self, Readiness};
use crate::network::ProbeOutcome;
use crate::{ProbeError, Result};
use log::debug;
use socket2::{SockAddr, Socket};
use std::io;
use std::net::SocketAddrV4;
use std::time::{Duration, Instant};

/// Drive a TCP connect on `socket` to completion or failure within
/// `timeout_ms`.
///
/// Plain `connect(2)` times out whenever the stack underneath decides,
/// commonly after more than a minute; this wrapper bounds the wait to
/// the caller's budget instead. A budget longer than the stack's own
/// cannot be honoured: the stack's timeout fires first and is reported
/// as `TimedOut`. `timeout_ms` must not be 0 (rejected up front);
/// negative means no bound beyond the system's.
///
/// The socket is forced non-blocking for the duration and its previous
/// mode restored on every exit path that changed it; a failed restore
/// supersedes the computed outcome.
pub fn connect_with_timeout(
    socket: &Socket,
    target: SocketAddrV4,
    timeout_ms: i32,
) -> Result<ProbeOutcome> {
    if timeout_ms == 0 {
        return Err(ProbeError::ZeroTimeout);
    }

    let changed = set_blocking(socket, false)?;
    let deadline = deadline_after(timeout_ms);
    let addr = SockAddr::from(target);

    debug!("connecting to {} with budget {} ms", target, timeout_ms);

    loop {
        match socket.connect(&addr) {
            // already reachable, e.g. loopback
            Ok(()) => return finish(socket, changed, ProbeOutcome::Connected),
            Err(e) if e.raw_os_error() == Some(libc::EINTR) => continue,
            Err(e) if is_in_progress(&e) => break,
            Err(e) => {
                let errno = e.raw_os_error().unwrap_or(0);
                return finish(socket, changed, ProbeOutcome::ConnectFailed { errno });
            }
        }
    }

    // the connect is in flight; completion surfaces as writable,
    // readable or erroring, so all three are registered together
    match poller::wait_connect_ready(socket, remaining_ms(deadline, timeout_ms)) {
        Ok(Readiness::NotReady) => finish(socket, changed, ProbeOutcome::TimedOut),
        Ok(Readiness::Ready) => match socket.take_error() {
            Ok(None) => finish(socket, changed, ProbeOutcome::Connected),
            // the stack's own connect timeout fired before our budget
            Ok(Some(e)) if e.raw_os_error() == Some(libc::ETIMEDOUT) => {
                finish(socket, changed, ProbeOutcome::TimedOut)
            }
            Ok(Some(e)) => {
                let errno = e.raw_os_error().unwrap_or(0);
                finish(socket, changed, ProbeOutcome::ConnectFailed { errno })
            }
            Err(e) => {
                restore_best_effort(socket, changed);
                Err(ProbeError::IoError(e))
            }
        },
        Err(e) => {
            restore_best_effort(socket, changed);
            Err(e)
        }
    }
}

/// `connect(2)` errno values meaning "in progress, wait for the
/// outcome" rather than failure
fn is_in_progress(e: &io::Error) -> bool {
    match e.raw_os_error() {
        Some(errno) => {
            errno == libc::EINPROGRESS
                || errno == libc::EWOULDBLOCK
                || errno == libc::EAGAIN
                || errno == libc::ENETDOWN
        }
        None => false,
    }
}

fn deadline_after(timeout_ms: i32) -> Option<Instant> {
    (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms as u64))
}

/// Budget left before `deadline`, in the `poll(2)` convention. A spent
/// budget polls once (0) rather than going negative, which would wait
/// forever.
fn remaining_ms(deadline: Option<Instant>, timeout_ms: i32) -> i32 {
    match deadline {
        None => timeout_ms, // negative budget: indefinite
        Some(deadline) => deadline
            .saturating_duration_since(Instant::now())
            .as_millis()
            .min(i32::MAX as u128) as i32,
    }
}

/// Restore the blocking mode if this call changed it, then hand the
/// outcome back. A restore failure supersedes the outcome.
fn finish(socket: &Socket, changed: bool, outcome: ProbeOutcome) -> Result<ProbeOutcome> {
    if changed {
        set_blocking(socket, true)?;
    }
    Ok(outcome)
}

/// Restore before propagating an error that is already on its way out;
/// the original error stays the one reported.
fn restore_best_effort(socket: &Socket, changed: bool) {
    if changed {
        let _ = set_blocking(socket, true);
    }
}
