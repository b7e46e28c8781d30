//! One-shot completion tokens
//!
//! Every dispatched item gets a fresh token; invoking it tells the engine
//! the item's asynchronous work is done. Two shapes exist:
//! - [`Advancer`]: handed out by `each`, only `advance()` is legal
//! - [`Supplier`]: handed out by `map`/`inject`, only `supply(value)` is legal
//!
//! Both are cheap handles over a shared one-shot slot, so clones can be
//! moved into callbacks. A second invocation on any clone fails with
//! [`UsageError::AlreadyCompleted`].

mod oneshot;

use std::rc::Rc;

use crate::UsageError;
use oneshot::OneShot;

/// Completion token for plain `each` iteration.
#[derive(Clone)]
pub struct Advancer {
    slot: Rc<OneShot<()>>,
}

impl Advancer {
    pub(crate) fn new<F>(item: usize, continuation: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            slot: Rc::new(OneShot::new(item, move |()| {
                continuation();
                Ok(())
            })),
        }
    }

    /// Signal that this item is done and let the engine move on.
    pub fn advance(&self) -> Result<(), UsageError> {
        self.slot.fire(())
    }

    /// Dispatch sequence number of the item this token belongs to.
    pub fn item(&self) -> usize {
        self.slot.item()
    }

    /// Whether the token has already been used.
    pub fn is_completed(&self) -> bool {
        self.slot.is_fired()
    }
}

/// Completion token that carries a value back (`map`, `inject`).
pub struct Supplier<V> {
    slot: Rc<OneShot<V>>,
}

impl<V: 'static> Supplier<V> {
    pub(crate) fn new<F>(item: usize, sink: F) -> Self
    where
        F: FnOnce(V) -> Result<(), UsageError> + 'static,
    {
        Self {
            slot: Rc::new(OneShot::new(item, sink)),
        }
    }

    /// Hand over this item's value and complete it.
    pub fn supply(&self, value: V) -> Result<(), UsageError> {
        self.slot.fire(value)
    }

    /// Dispatch sequence number of the item this token belongs to.
    pub fn item(&self) -> usize {
        self.slot.item()
    }

    /// Whether the token has already been used.
    pub fn is_completed(&self) -> bool {
        self.slot.is_fired()
    }
}

// Manual impl: cloning the handle must not require `V: Clone`.
impl<V> Clone for Supplier<V> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl std::fmt::Debug for Advancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advancer")
            .field("item", &self.slot.item())
            .field("completed", &self.slot.is_fired())
            .finish()
    }
}

impl<V> std::fmt::Debug for Supplier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supplier")
            .field("item", &self.slot.item())
            .field("completed", &self.slot.is_fired())
            .finish()
    }
}
