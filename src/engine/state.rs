//! Engine counters and the stats snapshot built from them

use std::cell::Cell;

/// Mutable engine counters.
///
/// Everything runs on one thread, so plain `Cell`s are enough. Outstanding
/// items are counted by the completion ledger, not here.
#[derive(Debug)]
pub(super) struct EngineState {
    pub(super) concurrency: Cell<usize>,
    /// Worker loops currently alive.
    pub(super) active: Cell<usize>,
    pub(super) started: Cell<bool>,
    pub(super) ended: Cell<bool>,
    pub(super) finished: Cell<bool>,
    pub(super) completed: Cell<usize>,
    pub(super) peak_pending: Cell<usize>,
    pub(super) peak_active: Cell<usize>,
}

impl EngineState {
    pub(super) fn new(concurrency: usize) -> Self {
        Self {
            concurrency: Cell::new(concurrency),
            active: Cell::new(0),
            started: Cell::new(false),
            ended: Cell::new(false),
            finished: Cell::new(false),
            completed: Cell::new(0),
            peak_pending: Cell::new(0),
            peak_active: Cell::new(0),
        }
    }

    pub(super) fn spawn_worker(&self) {
        let active = self.active.get() + 1;
        self.active.set(active);
        self.peak_active.set(self.peak_active.get().max(active));
    }

    pub(super) fn retire_worker(&self) {
        self.active.set(self.active.get().saturating_sub(1));
    }

    pub(super) fn item_dispatched(&self, outstanding: usize) {
        self.peak_pending.set(self.peak_pending.get().max(outstanding));
    }

    pub(super) fn item_completed(&self) {
        self.completed.set(self.completed.get() + 1);
    }

    /// Room for another worker under the current limit.
    pub(super) fn has_headroom(&self) -> bool {
        !self.ended.get() && self.active.get() < self.concurrency.get()
    }

    /// A worker should stop instead of pulling another item.
    pub(super) fn should_retire(&self) -> bool {
        self.ended.get() || self.active.get() > self.concurrency.get()
    }
}

/// Point-in-time view of an iterator's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IterationStats {
    /// Items handed to the step function.
    pub dispatched: usize,
    /// Items whose token has fired.
    pub completed: usize,
    /// Dispatched but not yet completed.
    pub in_flight: usize,
    /// Worker loops currently alive.
    pub active_workers: usize,
    /// Highest `in_flight` observed.
    pub peak_in_flight: usize,
    /// Highest `active_workers` observed.
    pub peak_workers: usize,
    /// `each` (or an aggregator) has been called.
    pub started: bool,
    /// The source reported exhaustion.
    pub ended: bool,
    /// The final callback has run.
    pub finished: bool,
    /// Bytes held by the per-item completion ledger.
    pub ledger_bytes: usize,
}
