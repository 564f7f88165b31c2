//! Run a synthetic workload through one execution strategy
//!
//! Every item records how many items were in flight when it started, so the
//! summary shows the peak concurrency the strategy actually reached.

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::cli::Output;
use crate::config::ExecutorSettings;
use crate::error::{AggregateError, Cancelled};
use crate::parallel::{self, CancellationToken, ExecutionConfig};

/// Execution strategy driven by `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Parallel map keeping odd items
    Map,
    /// Buffered partitions over cursors
    Buffered,
    /// Indexed partitions run one after another
    Indexed,
    /// Bounded interleaving behind an admission gate
    Interleaved,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Map => "map",
            Strategy::Buffered => "buffered",
            Strategy::Indexed => "indexed",
            Strategy::Interleaved => "interleaved",
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Strategy to exercise
    #[arg(short, long, value_enum, default_value_t = Strategy::Indexed)]
    pub strategy: Strategy,

    /// Number of work items
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub items: usize,

    /// Maximum parallelism (0 = derive from the CPU count)
    #[arg(short, long)]
    pub parallelism: Option<usize>,

    /// Simulated work per item, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub work_ms: u64,

    /// Database identity attached to diagnostics
    #[arg(long)]
    pub database: Option<String>,

    /// Make the item with this value fail
    #[arg(long, value_name = "ITEM")]
    pub fail_at: Option<usize>,
}

struct Workload {
    work: Duration,
    fail_at: Option<usize>,
    processed: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Workload {
    fn new(work: Duration, fail_at: Option<usize>) -> Self {
        Self {
            work,
            fail_at,
            processed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn process(&self, item: usize) -> Result<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        if !self.work.is_zero() {
            std::thread::sleep(self.work);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_at == Some(item) {
            bail!("work item {item} failed");
        }
        self.processed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Returns the number of items kept by the map strategy, `None` otherwise.
fn run_strategy(
    strategy: Strategy,
    config: &ExecutionConfig,
    items: &[usize],
    workload: &Workload,
) -> Result<Option<usize>> {
    match strategy {
        Strategy::Map => {
            let kept = parallel::apply(config, items.iter().copied(), |item| {
                workload.process(item)?;
                Ok((item % 2 == 1).then_some(item))
            })?;
            Ok(Some(kept.len()))
        }
        Strategy::Buffered => {
            parallel::execute_all_buffered(config, items, |cursor| {
                for &item in cursor {
                    workload.process(item)?;
                }
                Ok(())
            })?;
            Ok(None)
        }
        Strategy::Indexed => {
            parallel::execute_all(config, items, |&item, _index| workload.process(item))?;
            Ok(None)
        }
        Strategy::Interleaved => {
            parallel::execute_all_interleaved(config, items, |&item| workload.process(item))?;
            Ok(None)
        }
    }
}

/// Execute the run command
pub async fn execute(args: RunArgs, mut settings: ExecutorSettings, output: &Output) -> Result<()> {
    if let Some(parallelism) = args.parallelism {
        settings.max_parallel_index_tasks = parallelism;
    }
    if let Some(database) = &args.database {
        settings.database = Some(database.clone());
    }

    let cancellation = CancellationToken::new();
    let config = settings.execution_config()?.with_cancellation(cancellation.clone());

    output.header("Indexing Executor Run");
    output.table_row("Strategy", args.strategy.name());
    output.table_row("Items", &args.items.to_string());
    output.table_row("Max parallelism", &config.max_parallelism().to_string());
    output.table_row("Database", config.database());

    let workload = Arc::new(Workload::new(Duration::from_millis(args.work_ms), args.fail_at));
    let items: Vec<usize> = (0..args.items).collect();
    let started = Instant::now();

    let mut task = {
        let workload = Arc::clone(&workload);
        let strategy = args.strategy;
        tokio::task::spawn_blocking(move || run_strategy(strategy, &config, &items, &workload))
    };

    let result = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            output.warning("Interrupt received, cancelling");
            cancellation.cancel();
            task.await?
        }
    };
    let elapsed = started.elapsed();

    let kept = match result {
        Ok(kept) => kept,
        Err(err) if err.is::<Cancelled>() => {
            output.warning("Execution cancelled before all items were processed");
            None
        }
        Err(err) => {
            if let Some(aggregate) = err.downcast_ref::<AggregateError>() {
                for failure in aggregate.errors() {
                    output.error(&format!("{failure:#}"));
                }
            }
            return Err(err);
        }
    };

    output.blank_line();
    output.table_row("Processed", &workload.processed.load(Ordering::SeqCst).to_string());
    if let Some(kept) = kept {
        output.table_row("Kept", &kept.to_string());
    }
    output.table_row("Peak concurrency", &workload.peak.load(Ordering::SeqCst).to_string());
    output.table_row("Elapsed", &format!("{:.2?}", elapsed));
    output.success("Run completed");

    Ok(())
}
