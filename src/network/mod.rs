//! Network module: probe strategies, outcomes and the wire-level pieces

pub mod blocking;
pub mod checksum;
pub mod connect;
pub mod packet;
pub mod poller;
pub mod resolve;
pub mod socket;
pub mod stealth;
pub mod token;

use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddrV4;

use crate::config::ProbeConfig;
use crate::network::token::TokenGenerator;

/// Available connect strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeStrategy {
    /// Full TCP connect, driven to completion within the budget
    Connect,
    /// Half-open SYN probe; the handshake is never completed
    HalfOpen,
}

impl ProbeStrategy {
    /// Get the name of the strategy
    pub fn name(&self) -> &'static str {
        match self {
            ProbeStrategy::Connect => "Connect",
            ProbeStrategy::HalfOpen => "HalfOpen",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProbeStrategy::Connect => "TCP connect with bounded wait",
            ProbeStrategy::HalfOpen => "half-open SYN probe",
        }
    }

    /// Check if the strategy requires a raw socket (and the privilege to
    /// open one)
    pub fn requires_raw_socket(&self) -> bool {
        match self {
            ProbeStrategy::Connect => false,
            ProbeStrategy::HalfOpen => true,
        }
    }
}

/// Outcome of a single connect/probe attempt.
///
/// Protocol-level results are first-class variants here, not errors;
/// `Err(ProbeError)` is reserved for failures of the machinery itself
/// (bad input, missing privilege, syscall breakage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    /// The peer is reachable: the handshake completed, or the half-open
    /// reply carried SYN
    Connected,
    /// The caller's budget (or the stack's own connect timeout) elapsed
    TimedOut,
    /// The peer's stack answered negatively; carries the native error
    /// code, typically ECONNREFUSED
    ConnectFailed { errno: i32 },
}

impl ProbeOutcome {
    /// Map the outcome onto the conventional scanner port states
    pub fn port_state(&self) -> PortState {
        match self {
            ProbeOutcome::Connected => PortState::Open,
            ProbeOutcome::TimedOut => PortState::Filtered,
            ProbeOutcome::ConnectFailed { .. } => PortState::Closed,
        }
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Connected => write!(f, "connected"),
            ProbeOutcome::TimedOut => write!(f, "timed out"),
            ProbeOutcome::ConnectFailed { errno } => {
                write!(f, "connect failed (os error {})", errno)
            }
        }
    }
}

/// Port state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Filtered => write!(f, "filtered"),
        }
    }
}

/// Strategy-dispatching prober.
///
/// Owns the process-scoped state the strategies share: the configuration
/// and the correlation-token counter used by concurrently in-flight
/// half-open probes. Each `probe` call is synchronous and owns its
/// sockets exclusively, so one `Prober` can be shared across threads.
pub struct Prober {
    config: ProbeConfig,
    tokens: TokenGenerator,
}

impl Prober {
    pub fn new(config: ProbeConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tokens: TokenGenerator::new(),
        })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe `target` with the configured strategy and budget.
    pub fn probe(&self, target: SocketAddrV4) -> crate::Result<ProbeOutcome> {
        match self.config.strategy {
            ProbeStrategy::Connect => {
                let probe_socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
                connect::connect_with_timeout(&probe_socket, target, self.config.timeout_ms)
            }
            ProbeStrategy::HalfOpen => stealth::half_open_probe(
                &self.tokens,
                target,
                self.config.timeout_ms,
                self.config.tcp_window,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_accessors() {
        assert_eq!(ProbeStrategy::Connect.name(), "Connect");
        assert_eq!(ProbeStrategy::HalfOpen.name(), "HalfOpen");
        assert!(!ProbeStrategy::Connect.requires_raw_socket());
        assert!(ProbeStrategy::HalfOpen.requires_raw_socket());
    }

    #[test]
    fn outcome_maps_to_port_state() {
        assert_eq!(ProbeOutcome::Connected.port_state(), PortState::Open);
        assert_eq!(ProbeOutcome::TimedOut.port_state(), PortState::Filtered);
        assert_eq!(
            ProbeOutcome::ConnectFailed { errno: libc::ECONNREFUSED }.port_state(),
            PortState::Closed
        );
    }

    #[test]
    fn prober_rejects_zero_timeout_config() {
        let config = ProbeConfig::default().with_timeout_ms(0);
        assert!(Prober::new(config).is_err());
    }
}
