//! Per-item completion ledger
//!
//! One bit per dispatched item, indexed by dispatch sequence number.
//! Grows as items are dispatched, so it works for sources of unknown length.

use bitvec::prelude::*;

/// Tracks which dispatched items have completed.
#[derive(Debug, Default)]
pub struct CompletionLedger {
    completed: BitVec,
    outstanding: usize,
}

impl CompletionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new dispatch and return its sequence number.
    pub fn record_dispatch(&mut self) -> usize {
        let seq = self.completed.len();
        self.completed.push(false);
        self.outstanding += 1;
        seq
    }

    /// Mark `seq` complete. Returns `false` if it was unknown or already complete.
    pub fn mark_complete(&mut self, seq: usize) -> bool {
        match self.completed.get(seq).map(|bit| *bit) {
            Some(false) => {
                self.completed.set(seq, true);
                self.outstanding -= 1;
                true
            }
            _ => false,
        }
    }

    /// Whether `seq` has completed.
    pub fn is_complete(&self, seq: usize) -> bool {
        self.completed.get(seq).map(|bit| *bit).unwrap_or(false)
    }

    /// Items dispatched so far.
    pub fn dispatched(&self) -> usize {
        self.completed.len()
    }

    /// Dispatched items still waiting on their token.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Whether every dispatched item has completed.
    pub fn all_complete(&self) -> bool {
        self.outstanding == 0
    }

    /// Space usage in bytes (1 bit per item).
    pub fn space_usage(&self) -> usize {
        (self.completed.len() + 7) / 8
    }
}
