//! Engine behaviour under `each`: ordering, bounds, elastic concurrency,
//! and usage errors.

use std::cell::Cell;
use std::rc::Rc;

use tandem::{Advancer, AsyncIter, UsageError};
use test_case::test_case;
use test_helpers::*;

#[test]
fn test_sequential_dispatch_waits_for_previous_token() {
    let sched = scheduler();
    let log = EventLog::new();
    let iter = AsyncIter::from_vec((0..6).collect::<Vec<u32>>(), Rc::clone(&sched));

    let step_log = log.clone();
    let step_sched = Rc::clone(&sched);
    iter.for_each(move |item, token| {
        step_log.push(format!("start {item}"));
        let done_log = step_log.clone();
        defer(&step_sched, 2, move || {
            done_log.push(format!("done {item}"));
            token.advance().unwrap();
        });
    })
    .unwrap();

    sched.run_until_idle();

    let expected: Vec<String> = (0..6)
        .flat_map(|i| [format!("start {i}"), format!("done {i}")])
        .collect();
    assert_eq!(log.events(), expected);
    assert_eq!(iter.stats().peak_in_flight, 1);
}

#[test]
fn test_five_items_two_workers_visit_each_once() {
    let sched = scheduler();
    let log = EventLog::new();
    let iter = AsyncIter::from_vec(vec![1, 2, 3, 4, 5], Rc::clone(&sched)).with_concurrency(2);

    let step_log = log.clone();
    let step_sched = Rc::clone(&sched);
    let after_log = log.clone();
    iter.each(
        move |item: i32, token| {
            let done_log = step_log.clone();
            defer(&step_sched, 1, move || {
                done_log.push(format!("done {item}"));
                token.advance().unwrap();
            });
        },
        move || after_log.push("after"),
    )
    .unwrap();

    sched.run_until_idle();

    let events = log.events();
    assert_eq!(log.count("after"), 1);
    assert_eq!(events.last().map(String::as_str), Some("after"));
    let mut visited: Vec<String> = events.into_iter().filter(|e| e.starts_with("done")).collect();
    visited.sort();
    assert_eq!(visited, vec!["done 1", "done 2", "done 3", "done 4", "done 5"]);

    let stats = iter.stats();
    assert_eq!(stats.dispatched, 5);
    assert_eq!(stats.completed, 5);
    assert_eq!(stats.in_flight, 0);
    assert!(stats.finished);
}

#[test_case(1, 5 ; "sequential")]
#[test_case(2, 5 ; "pair")]
#[test_case(3, 2 ; "limit above size")]
#[test_case(4, 10 ; "four of ten")]
#[test_case(8, 3 ; "wide limit small source")]
fn test_in_flight_never_exceeds_limit(concurrency: usize, size: usize) {
    let sched = scheduler();
    let iter = AsyncIter::from_vec((0..size).collect::<Vec<_>>(), Rc::clone(&sched))
        .with_concurrency(concurrency);

    let in_flight = Rc::new(Cell::new(0usize));
    let peak = Rc::new(Cell::new(0usize));
    let (step_flight, step_peak) = (Rc::clone(&in_flight), Rc::clone(&peak));
    let step_sched = Rc::clone(&sched);
    iter.for_each(move |item: usize, token| {
        step_flight.set(step_flight.get() + 1);
        step_peak.set(step_peak.get().max(step_flight.get()));
        let flight = Rc::clone(&step_flight);
        defer(&step_sched, item % 3 + 1, move || {
            flight.set(flight.get() - 1);
            token.advance().unwrap();
        });
    })
    .unwrap();

    sched.run_until_idle();

    let bound = concurrency.min(size);
    assert_eq!(peak.get(), bound);
    assert_eq!(iter.stats().peak_in_flight, bound);
    assert!(iter.stats().peak_workers <= concurrency);
    assert_eq!(iter.stats().completed, size);
}

#[test]
fn test_empty_source_finishes_on_first_tick() {
    let sched = scheduler();
    let iter = AsyncIter::from_vec(Vec::<u8>::new(), Rc::clone(&sched)).with_concurrency(3);
    let dispatched = Rc::new(Cell::new(0));
    let finished = Rc::new(Cell::new(0));

    let (d, f) = (Rc::clone(&dispatched), Rc::clone(&finished));
    iter.each(
        move |_, token| {
            d.set(d.get() + 1);
            token.advance().unwrap();
        },
        move || f.set(f.get() + 1),
    )
    .unwrap();

    assert_eq!(finished.get(), 0);
    sched.tick();
    assert_eq!(finished.get(), 1);

    sched.run_until_idle();
    assert_eq!(finished.get(), 1);
    assert_eq!(dispatched.get(), 0);
}

#[test]
fn test_double_advance_is_usage_error() {
    let sched = scheduler();
    let errors = Rc::new(std::cell::RefCell::new(Vec::new()));
    let finished = Rc::new(Cell::new(0));
    let iter = AsyncIter::from_vec(vec!['x', 'y', 'z'], Rc::clone(&sched)).with_concurrency(2);

    let (errs, f) = (Rc::clone(&errors), Rc::clone(&finished));
    iter.each(
        move |_, token: Advancer| {
            token.advance().unwrap();
            if let Err(err) = token.advance() {
                errs.borrow_mut().push(err);
            }
        },
        move || f.set(f.get() + 1),
    )
    .unwrap();

    sched.run_until_idle();

    assert_eq!(
        *errors.borrow(),
        vec![
            UsageError::AlreadyCompleted { item: 0 },
            UsageError::AlreadyCompleted { item: 1 },
            UsageError::AlreadyCompleted { item: 2 },
        ]
    );
    assert_eq!(finished.get(), 1);
    assert_eq!(iter.stats().completed, 3);
    assert_eq!(iter.stats().in_flight, 0);
}

#[test]
fn test_late_duplicate_after_finish_does_not_refire() {
    let sched = scheduler();
    let held = Held::new();
    let finished = Rc::new(Cell::new(0));
    let iter = AsyncIter::from_vec(vec![1], Rc::clone(&sched));

    let (keep, f) = (held.clone(), Rc::clone(&finished));
    iter.each(move |_: i32, token: Advancer| keep.push(token), move || f.set(f.get() + 1))
        .unwrap();

    sched.tick();
    let token = held.take_all().pop().unwrap();
    token.advance().unwrap();
    sched.run_until_idle();
    assert_eq!(finished.get(), 1);

    assert_eq!(token.advance(), Err(UsageError::AlreadyCompleted { item: 0 }));
    sched.run_until_idle();
    assert_eq!(finished.get(), 1);
}

#[test]
fn test_each_twice_is_usage_error() {
    let sched = scheduler();
    let iter = AsyncIter::from_vec(vec![1, 2], Rc::clone(&sched));
    iter.for_each(|_, token| token.advance().unwrap()).unwrap();

    let second = iter.for_each(|_, token| token.advance().unwrap());
    assert_eq!(second.err(), Some(UsageError::AlreadyStarted));

    let as_map = iter.map(|item: i32, token| token.supply(item).unwrap(), |_| {});
    assert_eq!(as_map.err(), Some(UsageError::AlreadyStarted));

    sched.run_until_idle();
    assert_eq!(iter.stats().completed, 2);
}

#[test]
fn test_raising_concurrency_spawns_more_workers() {
    let sched = scheduler();
    let held: Held<(u32, Advancer)> = Held::new();
    let visited = EventLog::new();
    let iter = AsyncIter::from_vec((0..9).collect::<Vec<u32>>(), Rc::clone(&sched));

    let (keep, seen) = (held.clone(), visited.clone());
    iter.for_each(move |item, token| {
        seen.push(item.to_string());
        keep.push((item, token));
    })
    .unwrap();

    sched.tick();
    assert_eq!(held.len(), 1);

    // Eight items remain; widen while item 0 is still in flight.
    iter.set_concurrency(3);
    sched.tick();
    assert_eq!(held.len(), 3);
    assert_eq!(iter.stats().in_flight, 3);
    assert_eq!(visited.events(), vec!["0", "1", "2"]);

    loop {
        for (_, token) in held.take_all() {
            token.advance().unwrap();
        }
        if sched.tick() == 0 {
            break;
        }
    }

    let expected: Vec<String> = (0..9).map(|i| i.to_string()).collect();
    assert_eq!(visited.events(), expected);
    let stats = iter.stats();
    assert_eq!(stats.peak_in_flight, 3);
    assert_eq!(stats.completed, 9);
    assert!(stats.finished);
}

#[test]
fn test_lowering_concurrency_drains_without_interrupting() {
    let sched = scheduler();
    let held: Held<(u32, Advancer)> = Held::new();
    let iter = AsyncIter::from_vec((0..6).collect::<Vec<u32>>(), Rc::clone(&sched))
        .with_concurrency(3);

    let keep = held.clone();
    iter.for_each(move |item, token| keep.push((item, token)))
        .unwrap();

    sched.tick();
    assert_eq!(held.len(), 3);

    iter.set_concurrency(1);
    sched.tick();
    let stats = iter.stats();
    assert_eq!(stats.in_flight, 3, "in-flight items are not aborted");
    assert_eq!(stats.active_workers, 3);

    let expected_after_each = [(2, 2, 3), (1, 1, 3), (1, 1, 4)];
    for (active, in_flight, dispatched) in expected_after_each {
        let (_, token) = held.take_where(|_| true).unwrap();
        token.advance().unwrap();
        sched.tick();
        let stats = iter.stats();
        assert_eq!(stats.active_workers, active);
        assert_eq!(stats.in_flight, in_flight);
        assert_eq!(stats.dispatched, dispatched);
    }

    loop {
        for (_, token) in held.take_all() {
            token.advance().unwrap();
        }
        assert!(iter.stats().in_flight <= 1);
        if sched.tick() == 0 {
            break;
        }
    }
    assert_eq!(iter.stats().completed, 6);
    assert!(iter.stats().finished);
}
