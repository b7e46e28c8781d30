use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use tandem::{AsyncIter, IterationStats, LocalScheduler, Scheduler};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tandem",
    about = "Run the lines of a file through a bounded-concurrency async iteration"
)]
struct Cli {
    /// Log engine events at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Visit every line, printing dispatch and completion events.
    Each(RunArgs),
    /// Collect each line's length, reported in input order.
    Map(RunArgs),
    /// Fold line lengths into a single total.
    Inject(RunArgs),
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Input file (one item per non-empty line).
    input: PathBuf,
    /// Maximum items in flight (at least 1).
    #[arg(long, short, default_value_t = 1, value_parser = concurrency_limit())]
    concurrency: usize,
    /// Base number of ticks each item takes to complete.
    #[arg(long, default_value_t = 1)]
    latency: usize,
    /// Extra deterministic per-item delay in `0..=jitter` ticks.
    #[arg(long, default_value_t = 0)]
    jitter: usize,
    /// Change concurrency once this many items have completed.
    #[arg(long, requires = "resize_to")]
    resize_at: Option<usize>,
    /// New concurrency applied at `--resize-at` (at least 1).
    #[arg(long, requires = "resize_at", value_parser = concurrency_limit())]
    resize_to: Option<usize>,
}

/// The CLI cannot raise a limit of 0 later, so it would never finish.
fn concurrency_limit() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

impl RunArgs {
    fn delay_for(&self, index: usize, line: &str) -> usize {
        self.latency + (index * 7 + line.len()) % (self.jitter + 1)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Each(args) => run_each(args)?,
        Commands::Map(args) => run_map(args)?,
        Commands::Inject(args) => run_inject(args)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tandem=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_each(args: RunArgs) -> Result<()> {
    let scheduler = Rc::new(LocalScheduler::new());
    let lines = read_lines(&args.input)?;
    let iter = build_iter(&args, lines, &scheduler);

    let step_args = args.clone();
    let step_sched = Rc::clone(&scheduler);
    let done = Rc::new(Cell::new(false));
    let finished = Rc::clone(&done);
    let mut index = 0usize;
    iter.each(
        move |(line_no, line): (usize, String), token| {
            let delay = step_args.delay_for(index, &line);
            index += 1;
            println!(
                "tick {:>4}\tdispatch #{}\tline {}\t{}",
                step_sched.ticks_elapsed(),
                token.item(),
                line_no,
                line
            );
            let clock = Rc::clone(&step_sched);
            defer(&step_sched, delay, move || {
                println!("tick {:>4}\tcomplete #{}", clock.ticks_elapsed(), token.item());
                if let Err(err) = token.advance() {
                    error!(%err, "completion failed");
                }
            });
        },
        move || finished.set(true),
    )
    .context("failed to start iteration")?;

    drive(&scheduler, &iter, &args);
    anyhow::ensure!(done.get(), "iteration did not finish");
    print_stats(&iter.stats(), scheduler.ticks_elapsed());
    Ok(())
}

fn run_map(args: RunArgs) -> Result<()> {
    let scheduler = Rc::new(LocalScheduler::new());
    let lines = read_lines(&args.input)?;
    let iter = build_iter(&args, lines, &scheduler);

    let step_args = args.clone();
    let step_sched = Rc::clone(&scheduler);
    let results = Rc::new(RefCell::new(None));
    let out = Rc::clone(&results);
    let mut index = 0usize;
    iter.map(
        move |(line_no, line): (usize, String), token| {
            let delay = step_args.delay_for(index, &line);
            index += 1;
            defer(&step_sched, delay, move || {
                if let Err(err) = token.supply((line_no, line.len())) {
                    error!(%err, "completion failed");
                }
            });
        },
        move |values: Vec<(usize, usize)>| *out.borrow_mut() = Some(values),
    )
    .context("failed to start iteration")?;

    drive(&scheduler, &iter, &args);
    let values = results
        .borrow_mut()
        .take()
        .ok_or_else(|| anyhow::anyhow!("iteration did not finish"))?;
    for (line_no, len) in values {
        println!("line {}\tlength={}", line_no, len);
    }
    print_stats(&iter.stats(), scheduler.ticks_elapsed());
    Ok(())
}

fn run_inject(args: RunArgs) -> Result<()> {
    let scheduler = Rc::new(LocalScheduler::new());
    let lines = read_lines(&args.input)?;
    let iter = build_iter(&args, lines, &scheduler);

    if iter.concurrency() > 1 {
        warn!(
            concurrency = iter.concurrency(),
            "inject above concurrency 1 keeps the last completion, it does not merge"
        );
    }

    let step_args = args.clone();
    let step_sched = Rc::clone(&scheduler);
    let total = Rc::new(Cell::new(None));
    let out = Rc::clone(&total);
    let mut index = 0usize;
    iter.inject(
        0usize,
        move |acc, (_, line): (usize, String), token| {
            let delay = step_args.delay_for(index, &line);
            index += 1;
            defer(&step_sched, delay, move || {
                if let Err(err) = token.supply(acc + line.len()) {
                    error!(%err, "completion failed");
                }
            });
        },
        move |acc| out.set(Some(acc)),
    )
    .context("failed to start iteration")?;

    drive(&scheduler, &iter, &args);
    let total = total
        .get()
        .ok_or_else(|| anyhow::anyhow!("iteration did not finish"))?;
    println!("total length={}", total);
    print_stats(&iter.stats(), scheduler.ticks_elapsed());
    Ok(())
}

fn build_iter(
    args: &RunArgs,
    lines: Vec<(usize, String)>,
    scheduler: &Rc<LocalScheduler>,
) -> AsyncIter<(usize, String)> {
    let name = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    AsyncIter::new(
        tandem::ArraySource::new(lines),
        Rc::clone(scheduler),
        tandem::EngineConfig::new()
            .with_concurrency(args.concurrency)
            .with_name(name),
    )
}

/// Tick until idle, applying the optional mid-run resize.
fn drive<T: 'static>(scheduler: &LocalScheduler, iter: &AsyncIter<T>, args: &RunArgs) {
    let mut resize = args.resize_at.zip(args.resize_to);
    while scheduler.tick() > 0 {
        if let Some((at, to)) = resize {
            if iter.stats().completed >= at {
                println!(
                    "tick {:>4}\tconcurrency {} -> {}",
                    scheduler.ticks_elapsed(),
                    iter.concurrency(),
                    to
                );
                iter.set_concurrency(to);
                resize = None;
            }
        }
    }
}

/// Run `task` after `ticks` scheduler ticks (immediately when zero).
fn defer<F>(scheduler: &Rc<LocalScheduler>, ticks: usize, task: F)
where
    F: FnOnce() + 'static,
{
    if ticks == 0 {
        task();
        return;
    }
    let next = Rc::clone(scheduler);
    scheduler.schedule(Box::new(move || defer(&next, ticks - 1, task)));
}

fn read_lines(path: &PathBuf) -> Result<Vec<(usize, String)>> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?,
    );

    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        lines.push((idx + 1, line.to_string()));
    }
    Ok(lines)
}

fn print_stats(stats: &IterationStats, ticks: usize) {
    println!(
        "items={}\tpeak_in_flight={}\tpeak_workers={}\tticks={}",
        stats.completed, stats.peak_in_flight, stats.peak_workers, ticks
    );
}
