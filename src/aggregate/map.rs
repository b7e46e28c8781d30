//! Ordered result collection

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::AsyncIter;
use crate::token::Supplier;
use crate::UsageError;

/// Output slots shared by every in-flight item, indexed by input position.
type Slots<R> = Rc<RefCell<Vec<Option<R>>>>;

impl<T: 'static> AsyncIter<T> {
    /// Map every item to a value, collecting results in input order.
    ///
    /// `step(item, token)` calls `token.supply(value)`; the value is written
    /// at the item's original position, so `after(results)` sees input
    /// order no matter which items completed first.
    pub fn map<R, F, D>(&self, mut step: F, after: D) -> Result<&Self, UsageError>
    where
        R: 'static,
        F: FnMut(T, Supplier<R>) + 'static,
        D: FnOnce(Vec<R>) + 'static,
    {
        let slots: Slots<R> = Rc::new(RefCell::new(Vec::new()));
        let mut next_index = 0usize;

        self.inject(
            slots,
            move |slots: Slots<R>, item, supplier: Supplier<Slots<R>>| {
                let index = next_index;
                next_index += 1;
                slots.borrow_mut().resize_with(index + 1, || None);

                let token = Supplier::new(supplier.item(), move |value: R| {
                    slots.borrow_mut()[index] = Some(value);
                    supplier.supply(slots)
                });
                step(item, token);
            },
            move |slots| {
                let results: Vec<R> = slots.borrow_mut().drain(..).flatten().collect();
                after(results);
            },
        )
    }
}
