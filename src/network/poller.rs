//! Socket readiness polling with a bounded wait

use crate::{ProbeError, Result};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

/// Readiness class a wait targets. One call waits on exactly one class;
/// the connect driver's combined wait is the single deliberate exception
/// (see [`wait_connect_ready`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Readable,
    Writable,
    Exceptional,
}

impl Interest {
    fn events(self) -> libc::c_short {
        match self {
            Interest::Readable => libc::POLLIN,
            Interest::Writable => libc::POLLOUT,
            Interest::Exceptional => libc::POLLPRI,
        }
    }
}

/// Result of a readiness wait.
///
/// `NotReady` covers both "timeout elapsed" and "zero-timeout poll found
/// nothing"; the primitive does not distinguish them. Callers that need
/// to tell them apart must compare against their own `timeout_ms == 0`
/// case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady,
}

/// Wait up to `timeout_ms` for `socket` to become ready for `interest`.
///
/// `timeout_ms` follows the `poll(2)` convention: `< 0` waits
/// indefinitely, `0` polls once and returns immediately, `> 0` waits at
/// most that many milliseconds. A signal interrupting the wait restarts
/// it with the original timeout, so the countdown can restart after a
/// signal. `Err` is returned only for a failure of the polling primitive
/// itself, never for the awaited condition failing to occur.
pub fn wait_ready<S: AsRawFd>(socket: &S, interest: Interest, timeout_ms: i32) -> Result<Readiness> {
    poll_fd(socket.as_raw_fd(), interest.events(), timeout_ms)
}

/// Wait for the socket to become writable, readable or erroring, all
/// registered together. Only the connect driver needs a union of
/// classes (a completing connect can surface through any of the three);
/// everything else goes through [`wait_ready`].
pub(crate) fn wait_connect_ready<S: AsRawFd>(socket: &S, timeout_ms: i32) -> Result<Readiness> {
    poll_fd(
        socket.as_raw_fd(),
        libc::POLLIN | libc::POLLOUT | libc::POLLPRI,
        timeout_ms,
    )
}

fn poll_fd(fd: RawFd, events: libc::c_short, timeout_ms: i32) -> Result<Readiness> {
    let mut pollfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };

    loop {
        let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue; // signal interrupted us, poll again with the full timeout
            }
            return Err(ProbeError::Poll(err.to_string()));
        }
        return Ok(if rc == 0 {
            Readiness::NotReady
        } else {
            Readiness::Ready
        });
    }
}
