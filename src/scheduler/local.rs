//! Deterministic single-threaded scheduler

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::{Scheduler, Task};

/// In-process event loop driven explicitly by the caller.
///
/// Each [`tick`](LocalScheduler::tick) runs the tasks that were queued
/// before the tick began, in FIFO order. Tasks scheduled while a tick is
/// running are deferred to the next one, which is what makes "next tick"
/// observable in tests.
#[derive(Default)]
pub struct LocalScheduler {
    queue: RefCell<VecDeque<Task>>,
    ticks: Cell<usize>,
}

impl LocalScheduler {
    /// Create an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick. Returns the number of tasks executed.
    pub fn tick(&self) -> usize {
        let due = self.queue.borrow().len();
        if due == 0 {
            return 0;
        }
        self.ticks.set(self.ticks.get() + 1);

        let mut ran = 0;
        while ran < due {
            // Borrow only long enough to pop; the task may schedule more work.
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Run at most `max_ticks` ticks, stopping early once idle.
    ///
    /// Returns the number of ticks that executed at least one task.
    pub fn run_ticks(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() > 0 {
            ticks += 1;
        }
        ticks
    }

    /// Tick until no task remains queued. Returns the number of ticks run.
    ///
    /// Loops forever if tasks keep rescheduling themselves (for example a
    /// queue-backed iteration that is still waiting for input).
    pub fn run_until_idle(&self) -> usize {
        let mut ticks = 0;
        while self.tick() > 0 {
            ticks += 1;
        }
        ticks
    }

    /// Number of tasks waiting to run.
    pub fn pending_tasks(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Total ticks that ran at least one task.
    pub fn ticks_elapsed(&self) -> usize {
        self.ticks.get()
    }
}

impl Scheduler for LocalScheduler {
    fn schedule(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for LocalScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalScheduler")
            .field("pending_tasks", &self.pending_tasks())
            .field("ticks", &self.ticks.get())
            .finish()
    }
}
