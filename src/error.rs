//! Error handling for probe operations
//!
//! Failures of the probing machinery live here. Protocol-level results
//! (peer refused, budget elapsed) are not errors; they are
//! `ProbeOutcome` variants.

use thiserror::Error;

/// Main error type for probe operations
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A zero budget makes the bounded-connect wrappers redundant, so it
    /// is rejected before any syscall is made.
    #[error("timeout parameter can not be 0")]
    ZeroTimeout,

    #[error("poll error: {0}")]
    Poll(String),

    #[error("blocking-mode change failed: {0}")]
    Blocking(String),

    #[error("permission denied: {0}")]
    PermissionError(String),

    #[error("raw socket error: {0}")]
    RawSocketError(String),

    #[error("send error: {0}")]
    SendError(String),

    #[error("receive error: {0}")]
    RecvError(String),

    #[error("source address error: {0}")]
    SourceAddress(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
