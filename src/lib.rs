//! # Bounded-Concurrency Asynchronous Iteration
//!
//! Drives a user-supplied asynchronous step over every item of a sequence
//! while keeping at most `concurrency` items in flight, on a single-threaded
//! cooperative event loop supplied by the host.
//!
//! ## Core Pieces
//!
//! 1. **Sequence sources**: eager array, lazy generator, or async queue
//! 2. **Engine**: elastic worker spawning under a mutable concurrency cap
//! 3. **Completion tokens**: one-shot handles the step uses to signal "done"
//! 4. **Aggregators**: `map` (ordered results) and `inject` (fold)
//!
//! ## Usage Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tandem::{AsyncIter, LocalScheduler};
//!
//! let scheduler = Rc::new(LocalScheduler::new());
//! let lengths = Rc::new(RefCell::new(Vec::new()));
//! let out = Rc::clone(&lengths);
//!
//! AsyncIter::from_vec(vec!["ab", "c", "def"], Rc::clone(&scheduler))
//!     .with_concurrency(2)
//!     .map(
//!         |word: &str, token| token.supply(word.len()).unwrap(),
//!         move |values| *out.borrow_mut() = values,
//!     )?;
//!
//! scheduler.run_until_idle();
//! assert_eq!(*lengths.borrow(), vec![2, 1, 3]);
//! # Ok::<(), tandem::UsageError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

// Core modules
pub mod scheduler;  // Host event-loop capability
pub mod queue;      // Async queue capability
pub mod source;     // Sequence sources
pub mod token;      // One-shot completion tokens
pub mod ledger;     // Per-item completion tracking
pub mod engine;     // Worker spawning and concurrency control
mod aggregate;      // map / inject on top of each

// Re-exports for convenience
pub use engine::{AsyncIter, EngineConfig, IterationStats};
pub use queue::{AsyncQueue, LocalQueue};
pub use scheduler::{LocalScheduler, Scheduler, Task};
pub use source::{ArraySource, LazySource, QueueSource, SequenceSource, TransientEmpty};
pub use token::{Advancer, Supplier};

use thiserror::Error;

/// Misuse of the iteration API.
///
/// Raised synchronously to whoever committed the violation and never
/// retried. Iteration of other items carries on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    /// `each`, `map` or `inject` called on an iterator that already started.
    #[error("iteration already started; an iterator can only be driven once")]
    AlreadyStarted,

    /// A completion token was invoked a second time.
    #[error("completion token for item {item} invoked more than once")]
    AlreadyCompleted {
        /// Dispatch sequence number of the item.
        item: usize,
    },
}
