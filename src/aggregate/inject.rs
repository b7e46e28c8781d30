//! Accumulating fold

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::AsyncIter;
use crate::token::{Advancer, Supplier};
use crate::UsageError;

impl<T: 'static> AsyncIter<T> {
    /// Fold the items into one accumulator.
    ///
    /// `step(acc, item, token)` receives the accumulator as it stands at
    /// dispatch time; `token.supply(next)` overwrites the shared
    /// accumulator and completes the item. `after(acc)` gets the final value.
    ///
    /// With concurrency 1 this is an ordinary left fold. With more, several
    /// steps may start from the same snapshot and the last one to supply
    /// wins; nothing is merged or serialized.
    pub fn inject<A, F, D>(&self, initial: A, mut step: F, after: D) -> Result<&Self, UsageError>
    where
        A: Clone + 'static,
        F: FnMut(A, T, Supplier<A>) + 'static,
        D: FnOnce(A) + 'static,
    {
        let acc = Rc::new(RefCell::new(initial));
        let result = Rc::clone(&acc);

        self.each(
            move |item, advancer: Advancer| {
                let snapshot = acc.borrow().clone();
                let shared = Rc::clone(&acc);
                let token = Supplier::new(advancer.item(), move |next: A| {
                    *shared.borrow_mut() = next;
                    advancer.advance()
                });
                step(snapshot, item, token);
            },
            move || {
                let value = result.borrow().clone();
                after(value);
            },
        )
    }
}
