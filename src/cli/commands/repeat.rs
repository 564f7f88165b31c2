//! Register recurring actions and watch their timer group dissolve
//!
//! Every action invalidates itself after a fixed number of executions. Once
//! all of them are gone the scheduler releases the group's timer, which is
//! what this command waits for.

use anyhow::{Result, ensure};
use clap::Args;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::cli::Output;
use crate::repeat::{RepeatableAction, RepeatingActionScheduler};

#[derive(Args, Debug)]
pub struct RepeatArgs {
    /// Interval shared by every action, in milliseconds
    #[arg(short, long, default_value_t = 100)]
    pub interval_ms: u64,

    /// Number of actions registered
    #[arg(short, long, default_value_t = 3)]
    pub actions: usize,

    /// Executions after which each action becomes invalid
    #[arg(short, long, default_value_t = 5)]
    pub ticks: usize,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

struct CountingAction {
    name: String,
    interval: Duration,
    limit: usize,
    executed: AtomicUsize,
}

impl RepeatableAction for CountingAction {
    fn repeat_interval(&self) -> Duration {
        self.interval
    }

    fn is_valid(&self) -> bool {
        self.executed.load(Ordering::SeqCst) < self.limit
    }

    fn execute(&self) -> Result<()> {
        let count = self.executed.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(action = %self.name, count, "executed");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Execute the repeat command
pub async fn execute(args: RepeatArgs, output: &Output) -> Result<()> {
    ensure!(args.interval_ms > 0, "--interval-ms must be greater than zero");

    let interval = Duration::from_millis(args.interval_ms);
    let scheduler = RepeatingActionScheduler::default();

    let actions: Vec<Arc<CountingAction>> = (0..args.actions)
        .map(|i| {
            Arc::new(CountingAction {
                name: format!("action-{i}"),
                interval,
                limit: args.ticks,
                executed: AtomicUsize::new(0),
            })
        })
        .collect();

    output.header("Repeating Actions");
    output.table_row("Interval", &format!("{interval:?}"));
    output.table_row("Actions", &args.actions.to_string());
    output.table_row("Executions each", &args.ticks.to_string());

    for action in &actions {
        scheduler.repeat(action)?;
    }
    output.verbose(&format!("{} timer group(s) active", scheduler.group_count()));

    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    let poll = (interval / 2).max(Duration::from_millis(10));
    while scheduler.group_count() > 0 && Instant::now() < deadline {
        tokio::time::sleep(poll).await;
    }

    let dissolved = scheduler.group_count() == 0;
    if !dissolved {
        scheduler.shutdown();
    }

    output.blank_line();
    for action in &actions {
        output.table_row(&action.name, &action.executed.load(Ordering::SeqCst).to_string());
    }

    if dissolved {
        output.success("All actions completed and the timer group was released");
    } else {
        output.warning("Timed out waiting for the timer group; scheduler shut down");
    }

    Ok(())
}
