#[path = "common/mod.rs"]
mod common;

use std::rc::Rc;

use common::{assert_snapshot, render_trace};
use tandem::AsyncIter;
use test_helpers::*;

/// Four items, two workers, the first item slower than the rest: completion
/// order diverges from dispatch order and the last worker retires a tick
/// after the final callback.
#[test]
fn each_trace_matches_golden() {
    let sched = scheduler();
    let log = EventLog::new();
    let iter = AsyncIter::from_vec(vec!["a", "b", "c", "d"], Rc::clone(&sched)).with_concurrency(2);

    let step_sched = Rc::clone(&sched);
    let step_log = log.clone();
    let after_sched = Rc::clone(&sched);
    let after_log = log.clone();
    iter.each(
        move |item: &'static str, token| {
            step_log.push(format!("{} dispatch {}", step_sched.ticks_elapsed(), item));
            let latency = if item == "a" { 2 } else { 1 };
            let (clock, done_log) = (Rc::clone(&step_sched), step_log.clone());
            defer(&step_sched, latency, move || {
                done_log.push(format!("{} complete {}", clock.ticks_elapsed(), item));
                token.advance().unwrap();
            });
        },
        move || after_log.push(format!("{} after", after_sched.ticks_elapsed())),
    )
    .unwrap();

    let ticks = sched.run_until_idle();
    let mut events = log.events();
    events.push(format!(
        "ticks={} peak_in_flight={}",
        ticks,
        iter.stats().peak_in_flight
    ));

    assert_snapshot("traces/each_two_workers.txt", &render_trace(&events));
}
