//! Basic example: visit eight items two at a time, then widen to four.

use std::rc::Rc;

use tandem::{AsyncIter, LocalScheduler, Scheduler};

fn main() -> anyhow::Result<()> {
    let scheduler = Rc::new(LocalScheduler::new());
    let iter = AsyncIter::from_vec((1..=8).collect::<Vec<u32>>(), Rc::clone(&scheduler))
        .with_concurrency(2);

    let clock = Rc::clone(&scheduler);
    iter.each(
        move |item, token| {
            println!("tick {}: start {item}", clock.ticks_elapsed());
            // Pretend the work finishes on the next loop iteration.
            clock.schedule(Box::new(move || {
                println!("          done  {item}");
                token.advance().expect("each item advances once");
            }));
        },
        || println!("all items done"),
    )?;

    scheduler.run_ticks(3);
    iter.set_concurrency(4);
    scheduler.run_until_idle();

    let stats = iter.stats();
    println!(
        "completed={} peak_in_flight={} ticks={}",
        stats.completed,
        stats.peak_in_flight,
        scheduler.ticks_elapsed()
    );
    Ok(())
}
