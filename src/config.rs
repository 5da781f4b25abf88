//! Configuration for probe operations

use crate::network::ProbeStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by every probe a [`crate::Prober`] runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Connect strategy to dispatch on
    pub strategy: ProbeStrategy,

    /// Time budget per attempt in milliseconds. Negative waits
    /// indefinitely; 0 is rejected by both connect strategies.
    pub timeout_ms: i32,

    /// Receive window advertised in the half-open probe's SYN
    pub tcp_window: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            strategy: ProbeStrategy::Connect,
            timeout_ms: 3000, // LAN peers answer in single-digit ms, internet paths can take hundreds
            tcp_window: 512,
        }
    }
}

impl ProbeConfig {
    /// Create a configuration for the given strategy
    pub fn new(strategy: ProbeStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Set the time budget in milliseconds
    pub fn with_timeout_ms(mut self, timeout_ms: i32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the advertised TCP window
    pub fn with_tcp_window(mut self, tcp_window: u16) -> Self {
        self.tcp_window = tcp_window;
        self
    }

    /// Budget as a `Duration`; `None` for an unbounded (negative) budget
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms as u64))
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.timeout_ms == 0 {
            return Err(crate::ProbeError::ConfigError(
                "timeout_ms can not be 0".to_string(),
            ));
        }
        Ok(())
    }
}
