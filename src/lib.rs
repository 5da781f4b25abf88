//! synprobe - timeout-bounded TCP reachability probes
//!
//! Two connect strategies behind one selectable interface: a full TCP
//! connect driven to completion within a caller-supplied budget, and a
//! half-open SYN probe that classifies a port from the peer's first
//! reply without ever completing the three-way handshake.

pub mod config;
pub mod error;
pub mod network;

// Re-export commonly used types
pub use config::ProbeConfig;
pub use error::ProbeError;
pub use network::blocking::set_blocking;
pub use network::checksum::checksum;
pub use network::connect::connect_with_timeout;
pub use network::poller::{wait_ready, Interest, Readiness};
pub use network::resolve::{resolve_ipv4, source_addr_for};
pub use network::stealth::half_open_probe;
pub use network::token::TokenGenerator;
pub use network::{PortState, ProbeOutcome, ProbeStrategy, Prober};

pub type Result<T> = std::result::Result<T, ProbeError>;
