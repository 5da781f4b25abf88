//! Correlation tokens for matching probe replies

use std::sync::atomic::{AtomicU16, Ordering};

/// Generates process-unique, non-zero 16-bit correlation tokens.
///
/// A token rides in both the source-port and sequence-number fields of a
/// probe segment; the peer echoes it back in the destination-port field
/// of its reply, which is how a probe recognises its own answer amid the
/// unrelated traffic a raw socket also receives. Zero is reserved (the
/// kernel rewrites a zero source port), so generation skips past it.
///
/// The counter is an atomic so that probes in flight on several threads
/// at once still draw distinct tokens.
#[derive(Debug, Default)]
pub struct TokenGenerator {
    counter: AtomicU16,
}

impl TokenGenerator {
    pub const fn new() -> Self {
        Self {
            counter: AtomicU16::new(0),
        }
    }

    /// Next token: process id plus a monotonically incremented counter,
    /// re-drawn if the sum lands on the reserved zero. Tokens stay
    /// distinct until the 16-bit counter wraps.
    pub fn next(&self) -> u16 {
        loop {
            let n = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            let token = (std::process::id() as u16).wrapping_add(n);
            if token != 0 {
                return token;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn never_yields_zero() {
        let tokens = TokenGenerator::new();
        // a full wrap of the counter passes the reserved value once
        for _ in 0..=u16::MAX as u32 {
            assert_ne!(tokens.next(), 0);
        }
    }

    #[test]
    fn concurrent_draws_do_not_collide() {
        let tokens = Arc::new(TokenGenerator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let tokens = Arc::clone(&tokens);
            handles.push(thread::spawn(move || {
                (0..1000).map(|_| tokens.next()).collect::<Vec<u16>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token), "token {:#06x} drawn twice", token);
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
