//! Per-connection challenge state and the device-wide nonce history.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use gatt_attest_primitives::nonce::{Nonce, NONCE_LEN};

#[derive(Debug, Default)]
pub(crate) enum Session {
    #[default]
    Idle,
    /// A long write is in flight.
    Writing { buf: Vec<u8> },
    /// A nonce is armed and waiting for the verifier's first read.
    Challenged { nonce: Nonce, armed_at: Instant },
    /// Evidence for `nonce` was generated and is being read in blobs.
    Serving { nonce: Nonce, encoded: Vec<u8> },
}

/// Nonces seen recently across all connections, oldest first.
#[derive(Debug)]
pub(crate) struct NonceHistory {
    order: VecDeque<Nonce>,
    seen: HashSet<Nonce>,
    capacity: usize,
}

impl NonceHistory {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            seen: HashSet::new(),
            capacity,
        }
    }

    /// Record `nonce`, returning `false` if it was already present.
    pub(crate) fn insert(&mut self, nonce: Nonce) -> bool {
        if self.capacity == 0 {
            return true;
        }

        if !self.seen.insert(nonce) {
            return false;
        }

        self.order.push_back(nonce);

        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                let _ = self.seen.remove(&oldest);
            }
        }

        true
    }
}

pub(crate) const fn is_complete(len: usize) -> bool {
    len == NONCE_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nonce(byte: u8) -> Nonce {
        Nonce::from_slice(&[byte; NONCE_LEN]).unwrap()
    }

    #[test]
    fn test_history_rejects_duplicates() {
        let mut history = NonceHistory::new(4);

        assert!(history.insert(nonce(1)), "first sighting");
        assert!(!history.insert(nonce(1)), "second sighting");
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = NonceHistory::new(2);

        assert!(history.insert(nonce(1)), "1");
        assert!(history.insert(nonce(2)), "2");
        assert!(history.insert(nonce(3)), "3 evicts 1");
        assert!(history.insert(nonce(1)), "1 was forgotten");
        assert!(!history.insert(nonce(3)), "3 is still remembered");
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut history = NonceHistory::new(usize::MAX);

        assert!(history.insert(nonce(1)), "first");
        assert!(!history.insert(nonce(1)), "duplicate");
        assert_eq!(history.order.len(), 1);
    }

    #[test]
    fn test_zero_capacity_disables_history() {
        let mut history = NonceHistory::new(0);

        assert!(history.insert(nonce(1)), "first");
        assert!(history.insert(nonce(1)), "history disabled");
    }
}
