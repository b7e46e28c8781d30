//! Async-queue source

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::{SequenceSource, TransientEmpty};
use crate::queue::AsyncQueue;

/// Drains an [`AsyncQueue`], never reporting exhaustion.
///
/// At most one `pop` is outstanding at a time. Whatever it delivers is
/// buffered here and handed to the next `produce_next` call.
pub struct QueueSource<T> {
    queue: Rc<dyn AsyncQueue<T>>,
    ready: Rc<RefCell<VecDeque<T>>>,
    awaiting: Rc<Cell<bool>>,
}

impl<T: 'static> QueueSource<T> {
    /// Wrap a shared queue.
    pub fn new<Q: AsyncQueue<T> + 'static>(queue: Rc<Q>) -> Self {
        Self {
            queue,
            ready: Rc::new(RefCell::new(VecDeque::new())),
            awaiting: Rc::new(Cell::new(false)),
        }
    }

    /// Whether a `pop` request is still waiting on the queue.
    pub fn is_awaiting(&self) -> bool {
        self.awaiting.get()
    }

    fn request(&self) {
        self.awaiting.set(true);
        let ready = Rc::clone(&self.ready);
        let awaiting = Rc::clone(&self.awaiting);
        self.queue.pop(Box::new(move |item| {
            ready.borrow_mut().push_back(item);
            awaiting.set(false);
        }));
    }
}

impl<T: 'static> SequenceSource<T> for QueueSource<T> {
    fn produce_next(&mut self) -> Result<Option<T>, TransientEmpty> {
        if let Some(item) = self.ready.borrow_mut().pop_front() {
            return Ok(Some(item));
        }
        if !self.awaiting.get() {
            self.request();
        }
        Err(TransientEmpty)
    }
}

impl<T> std::fmt::Debug for QueueSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSource")
            .field("ready", &self.ready.borrow().len())
            .field("awaiting", &self.awaiting.get())
            .finish()
    }
}
