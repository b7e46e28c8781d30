//! Bounded-concurrency iteration engine
//!
//! Drives a step function over every item of a [`SequenceSource`] with at
//! most `concurrency` items in flight:
//! - a spawn loop runs every tick and is the only place that adds workers
//! - each worker pulls one item, dispatches it with a fresh [`Advancer`],
//!   and resumes (on the next tick) when that token fires
//! - workers above the current limit retire instead of pulling again
//! - the final callback fires once, when the source is exhausted and no
//!   item is pending
//!
//! All state lives on one thread. The step closure stays borrowed while it
//! runs, so the engine never dispatches synchronously from inside a step: a
//! token continuation only records the completion and schedules the
//! worker's next pull. The final callback runs with no engine borrow held.

mod config;
mod state;

pub use config::EngineConfig;
pub use state::IterationStats;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::ledger::CompletionLedger;
use crate::queue::AsyncQueue;
use crate::scheduler::Scheduler;
use crate::source::{ArraySource, LazySource, QueueSource, SequenceSource, TransientEmpty};
use crate::token::Advancer;
use crate::UsageError;
use state::EngineState;

type StepFn<T> = Box<dyn FnMut(T, Advancer) + 'static>;
type AfterFn = Box<dyn FnOnce() + 'static>;

/// Single-use asynchronous iterator over a sequence source.
///
/// Construct it from a `Vec`, slice, iterator or async queue, then call
/// exactly one of [`each`](AsyncIter::each), [`map`](AsyncIter::map) or
/// [`inject`](AsyncIter::inject). Work only progresses while the host
/// scheduler ticks.
pub struct AsyncIter<T: 'static> {
    core: Rc<Core<T>>,
}

struct Core<T: 'static> {
    name: String,
    source: RefCell<Box<dyn SequenceSource<T>>>,
    scheduler: Rc<dyn Scheduler>,
    state: EngineState,
    ledger: RefCell<CompletionLedger>,
    step: RefCell<Option<StepFn<T>>>,
    after: RefCell<Option<AfterFn>>,
}

impl<T: 'static> AsyncIter<T> {
    /// Create an iterator over any source.
    pub fn new<Src, S>(source: Src, scheduler: Rc<S>, config: EngineConfig) -> Self
    where
        Src: SequenceSource<T> + 'static,
        S: Scheduler + 'static,
    {
        let source: Box<dyn SequenceSource<T>> = Box::new(source);
        Self {
            core: Rc::new(Core {
                name: config.name,
                source: RefCell::new(source),
                scheduler,
                state: EngineState::new(config.concurrency),
                ledger: RefCell::new(CompletionLedger::new()),
                step: RefCell::new(None),
                after: RefCell::new(None),
            }),
        }
    }

    /// Iterate an owned vector.
    pub fn from_vec<S: Scheduler + 'static>(items: Vec<T>, scheduler: Rc<S>) -> Self {
        Self::new(ArraySource::new(items), scheduler, EngineConfig::default())
    }

    /// Iterate a private copy of `items`.
    pub fn from_slice<S: Scheduler + 'static>(items: &[T], scheduler: Rc<S>) -> Self
    where
        T: Clone,
    {
        Self::new(ArraySource::from_slice(items), scheduler, EngineConfig::default())
    }

    /// Iterate a lazy generator, pulling one value per dispatch.
    pub fn from_lazy<I, S>(iter: I, scheduler: Rc<S>) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
        S: Scheduler + 'static,
    {
        Self::new(LazySource::new(iter), scheduler, EngineConfig::default())
    }

    /// Iterate whatever arrives on an async queue. Never ends on its own.
    ///
    /// The completion ledger keeps one bit per dispatched item for the life
    /// of the iterator; watch [`IterationStats::ledger_bytes`] on long-lived
    /// queues.
    pub fn from_queue<Q, S>(queue: Rc<Q>, scheduler: Rc<S>) -> Self
    where
        Q: AsyncQueue<T> + 'static,
        S: Scheduler + 'static,
    {
        Self::new(QueueSource::new(queue), scheduler, EngineConfig::default())
    }

    /// Builder form of [`set_concurrency`](AsyncIter::set_concurrency).
    pub fn with_concurrency(self, concurrency: usize) -> Self {
        self.set_concurrency(concurrency);
        self
    }

    /// Current concurrency limit.
    pub fn concurrency(&self) -> usize {
        self.core.state.concurrency.get()
    }

    /// Change the concurrency limit, even mid-run.
    ///
    /// Raising it lets the spawn loop add workers on its next tick.
    /// Lowering it interrupts nothing; surplus workers retire as their
    /// current items complete.
    pub fn set_concurrency(&self, concurrency: usize) {
        let previous = self.core.state.concurrency.replace(concurrency);
        if previous != concurrency {
            debug!(
                iter = %self.core.name,
                from = previous,
                to = concurrency,
                active = self.core.state.active.get(),
                "concurrency changed"
            );
        }
    }

    /// Label used in log records.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> IterationStats {
        let state = &self.core.state;
        let ledger = self.core.ledger.borrow();
        IterationStats {
            dispatched: ledger.dispatched(),
            completed: state.completed.get(),
            in_flight: ledger.outstanding(),
            active_workers: state.active.get(),
            peak_in_flight: state.peak_pending.get(),
            peak_workers: state.peak_active.get(),
            started: state.started.get(),
            ended: state.ended.get(),
            finished: state.finished.get(),
            ledger_bytes: ledger.space_usage(),
        }
    }

    /// Whether dispatched item `seq` has completed.
    pub fn is_item_complete(&self, seq: usize) -> bool {
        self.core.ledger.borrow().is_complete(seq)
    }

    /// Drive `step(item, token)` over every item, then call `after()` once.
    ///
    /// Returns immediately; nothing is dispatched until the scheduler ticks.
    /// The step must eventually call [`Advancer::advance`] exactly once per
    /// item. Fails if this iterator was already started.
    pub fn each<F, D>(&self, step: F, after: D) -> Result<&Self, UsageError>
    where
        F: FnMut(T, Advancer) + 'static,
        D: FnOnce() + 'static,
    {
        let state = &self.core.state;
        if state.started.replace(true) {
            return Err(UsageError::AlreadyStarted);
        }
        *self.core.step.borrow_mut() = Some(Box::new(step));
        *self.core.after.borrow_mut() = Some(Box::new(after));

        debug!(
            iter = %self.core.name,
            concurrency = state.concurrency.get(),
            size_hint = ?self.core.source.borrow().size_hint(),
            "iteration started"
        );
        self.core.arm_spawner();
        Ok(self)
    }

    /// [`each`](AsyncIter::each) without a final callback.
    pub fn for_each<F>(&self, step: F) -> Result<&Self, UsageError>
    where
        F: FnMut(T, Advancer) + 'static,
    {
        self.each(step, || {})
    }
}

impl<T: 'static> Core<T> {
    fn arm_spawner(self: &Rc<Self>) {
        let core = Rc::clone(self);
        self.scheduler.schedule(Box::new(move || core.spawn_workers()));
    }

    fn arm_step(self: &Rc<Self>) {
        let core = Rc::clone(self);
        self.scheduler.schedule(Box::new(move || core.run_step()));
    }

    /// Fill free worker slots, then re-arm for the next tick until the
    /// source has ended.
    fn spawn_workers(self: &Rc<Self>) {
        while self.state.has_headroom() {
            self.state.spawn_worker();
            trace!(iter = %self.name, active = self.state.active.get(), "worker spawned");
            self.run_step();
        }
        if !self.state.ended.get() {
            self.arm_spawner();
        }
    }

    /// One pass of a worker: retire, retry, finish, or dispatch one item.
    fn run_step(self: &Rc<Self>) {
        if self.state.should_retire() {
            self.retire();
            return;
        }

        let next = self.source.borrow_mut().produce_next();
        match next {
            Err(TransientEmpty) => {
                trace!(iter = %self.name, "source not ready, retrying next tick");
                self.arm_step();
            }
            Ok(None) => {
                self.state.ended.set(true);
                debug!(
                    iter = %self.name,
                    pending = self.outstanding(),
                    "source exhausted"
                );
                self.retire();
                if self.ledger.borrow().all_complete() {
                    self.finish();
                }
            }
            Ok(Some(item)) => self.dispatch(item),
        }
    }

    fn dispatch(self: &Rc<Self>, item: T) {
        let seq = self.ledger.borrow_mut().record_dispatch();
        let pending = self.outstanding();
        self.state.item_dispatched(pending);
        trace!(iter = %self.name, item = seq, pending, "dispatch");

        let core = Rc::clone(self);
        let token = Advancer::new(seq, move || core.complete_item(seq));

        let mut step = self.step.borrow_mut();
        if let Some(step) = step.as_mut() {
            step(item, token);
        }
    }

    /// Continuation behind every token.
    fn complete_item(self: &Rc<Self>, seq: usize) {
        let marked = self.ledger.borrow_mut().mark_complete(seq);
        if !marked {
            warn!(iter = %self.name, item = seq, "completion for unknown or finished item ignored");
            return;
        }
        self.state.item_completed();
        let pending = self.outstanding();
        trace!(iter = %self.name, item = seq, pending, "complete");

        if self.state.ended.get() {
            self.retire();
            if pending == 0 {
                self.finish();
            }
        } else {
            self.arm_step();
        }
    }

    fn outstanding(&self) -> usize {
        self.ledger.borrow().outstanding()
    }

    fn retire(&self) {
        self.state.retire_worker();
        trace!(iter = %self.name, active = self.state.active.get(), "worker retired");
    }

    /// Run the final callback once and release the step closure.
    fn finish(&self) {
        let after = self.after.borrow_mut().take();
        if let Some(after) = after {
            self.state.finished.set(true);
            let step = self.step.borrow_mut().take();
            drop(step);
            debug!(
                iter = %self.name,
                completed = self.state.completed.get(),
                "iteration finished"
            );
            after();
        }
    }
}

impl<T: 'static> std::fmt::Debug for AsyncIter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncIter")
            .field("name", &self.core.name)
            .field("concurrency", &self.concurrency())
            .field("stats", &self.stats())
            .finish()
    }
}
