//! Socket blocking-mode control

use crate::{ProbeError, Result};
use std::io;
use std::os::unix::io::AsRawFd;

/// Put `socket` into blocking or non-blocking mode.
///
/// The current mode is queried first; a socket already in the requested
/// mode is left untouched. The returned flag reports whether a change
/// was actually made, so callers can restore the original mode
/// afterwards (restoring when nothing changed is then a no-op). A port
/// to a platform whose socket layer cannot query the current mode must
/// report `true` unconditionally, which keeps unconditional restores
/// correct at the cost of one redundant mode-set.
///
/// Failure here is fatal to a connect attempt; callers abort and surface
/// the message.
pub fn set_blocking<S: AsRawFd>(socket: &S, blocking: bool) -> Result<bool> {
    let fd = socket.as_raw_fd();

    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL, 0) };
    if flags < 0 {
        return Err(ProbeError::Blocking(format!(
            "fcntl(F_GETFL) failed: {}",
            io::Error::last_os_error()
        )));
    }

    let currently_blocking = flags & libc::O_NONBLOCK == 0;
    if currently_blocking == blocking {
        return Ok(false);
    }

    let flags = if blocking {
        flags & !libc::O_NONBLOCK
    } else {
        flags | libc::O_NONBLOCK
    };
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
        return Err(ProbeError::Blocking(format!(
            "fcntl(F_SETFL) failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(true)
}
