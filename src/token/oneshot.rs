//! Shared one-shot slot behind both token shapes

use std::cell::RefCell;

use crate::UsageError;

type Completion<A> = Box<dyn FnOnce(A) -> Result<(), UsageError> + 'static>;

/// Holds a completion until it is fired; empty afterwards.
pub(super) struct OneShot<A> {
    item: usize,
    completion: RefCell<Option<Completion<A>>>,
}

impl<A> OneShot<A> {
    pub(super) fn new<F>(item: usize, completion: F) -> Self
    where
        F: FnOnce(A) -> Result<(), UsageError> + 'static,
    {
        Self {
            item,
            completion: RefCell::new(Some(Box::new(completion))),
        }
    }

    pub(super) fn item(&self) -> usize {
        self.item
    }

    pub(super) fn is_fired(&self) -> bool {
        self.completion.borrow().is_none()
    }

    /// Take the completion and run it. The slot is emptied before the
    /// completion runs, so re-entrant calls see it as already fired.
    pub(super) fn fire(&self, arg: A) -> Result<(), UsageError> {
        let completion = self
            .completion
            .borrow_mut()
            .take()
            .ok_or(UsageError::AlreadyCompleted { item: self.item })?;
        completion(arg)
    }
}
