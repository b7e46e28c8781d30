//! Async queue capability backing queue-driven iteration
//!
//! Only the `push`/`pop(on_item)` contract matters to the engine; any
//! host queue can stand in for [`LocalQueue`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::scheduler::Scheduler;

/// Callback receiving one popped item.
pub type OnItem<T> = Box<dyn FnOnce(T) + 'static>;

/// Queue whose consumers are notified asynchronously.
pub trait AsyncQueue<T> {
    /// Append an item.
    fn push(&self, item: T);

    /// Request one item. `on_item` runs on a later tick once an item is
    /// available, never synchronously inside `pop`.
    fn pop(&self, on_item: OnItem<T>);
}

/// FIFO queue delivering items through a [`Scheduler`].
pub struct LocalQueue<T> {
    scheduler: Rc<dyn Scheduler>,
    inner: RefCell<QueueInner<T>>,
}

struct QueueInner<T> {
    items: VecDeque<T>,
    waiters: VecDeque<OnItem<T>>,
}

impl<T: 'static> LocalQueue<T> {
    /// Create an empty queue that delivers on `scheduler`.
    pub fn new<S: Scheduler + 'static>(scheduler: Rc<S>) -> Self {
        Self {
            scheduler,
            inner: RefCell::new(QueueInner {
                items: VecDeque::new(),
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Push several items in order.
    pub fn extend<I: IntoIterator<Item = T>>(&self, items: I) {
        for item in items {
            self.push(item);
        }
    }

    /// Buffered items not yet handed to a consumer.
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    /// Whether no item is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumers blocked in `pop`.
    pub fn waiting(&self) -> usize {
        self.inner.borrow().waiters.len()
    }

    fn deliver(&self, on_item: OnItem<T>, item: T) {
        self.scheduler.schedule(Box::new(move || on_item(item)));
    }
}

impl<T: 'static> AsyncQueue<T> for LocalQueue<T> {
    fn push(&self, item: T) {
        let waiter = self.inner.borrow_mut().waiters.pop_front();
        match waiter {
            Some(on_item) => self.deliver(on_item, item),
            None => self.inner.borrow_mut().items.push_back(item),
        }
    }

    fn pop(&self, on_item: OnItem<T>) {
        let item = self.inner.borrow_mut().items.pop_front();
        match item {
            Some(item) => self.deliver(on_item, item),
            None => self.inner.borrow_mut().waiters.push_back(on_item),
        }
    }
}

impl<T> std::fmt::Debug for LocalQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LocalQueue")
            .field("items", &inner.items.len())
            .field("waiters", &inner.waiters.len())
            .finish()
    }
}
