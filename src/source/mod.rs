//! Sequence sources feeding the iteration engine
//!
//! Three variants share one contract:
//! - [`ArraySource`]: eager, owned copy of a finite sequence
//! - [`LazySource`]: pulls from any [`Iterator`] on demand
//! - [`QueueSource`]: drains an [`AsyncQueue`](crate::queue::AsyncQueue),
//!   reporting [`TransientEmpty`] while no item is ready

mod array;
mod lazy;
mod queue;

pub use array::ArraySource;
pub use lazy::LazySource;
pub use queue::QueueSource;

use thiserror::Error;

/// No item is ready yet, but the source is not exhausted.
///
/// Only queue-backed sources produce this. The engine retries the same
/// step on the next tick; callers never observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("source has no item ready (not exhausted)")]
pub struct TransientEmpty;

/// Supplies items one at a time.
pub trait SequenceSource<T> {
    /// Next item.
    ///
    /// `Ok(Some(item))` hands out an item, `Ok(None)` reports exhaustion and
    /// `Err(TransientEmpty)` asks the caller to retry later.
    fn produce_next(&mut self) -> Result<Option<T>, TransientEmpty>;

    /// Remaining items, when known.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

impl<T, S: SequenceSource<T> + ?Sized> SequenceSource<T> for Box<S> {
    fn produce_next(&mut self) -> Result<Option<T>, TransientEmpty> {
        (**self).produce_next()
    }

    fn size_hint(&self) -> Option<usize> {
        (**self).size_hint()
    }
}
