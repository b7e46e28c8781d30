//! Queue-backed iteration: items are pushed while the iterator is running.

use std::cell::RefCell;
use std::rc::Rc;

use tandem::{AsyncIter, AsyncQueue, LocalQueue, LocalScheduler};

fn main() -> anyhow::Result<()> {
    let scheduler = Rc::new(LocalScheduler::new());
    let queue = Rc::new(LocalQueue::new(Rc::clone(&scheduler)));
    let iter = AsyncIter::from_queue(Rc::clone(&queue), Rc::clone(&scheduler)).with_concurrency(2);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    iter.for_each(move |job: String, token| {
        sink.borrow_mut().push(job);
        token.advance().expect("each item advances once");
    })?;

    queue.push("first".to_string());
    scheduler.run_ticks(5);
    queue.extend(["second".to_string(), "third".to_string()]);
    scheduler.run_ticks(10);

    // A queue source never reports exhaustion, so the iteration stays open.
    println!("handled {:?}", seen.borrow());
    println!("ended={}", iter.stats().ended);
    Ok(())
}
