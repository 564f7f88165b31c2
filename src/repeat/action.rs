use anyhow::Result;
use std::time::Duration;

/// A background action executed periodically by the
/// [`RepeatingActionScheduler`](super::RepeatingActionScheduler)
pub trait RepeatableAction: Send + Sync {
    /// Interval between executions; actions sharing an interval share a timer.
    fn repeat_interval(&self) -> Duration;

    /// Polled on every tick. Once false the action is dropped from its group
    /// without being executed again.
    fn is_valid(&self) -> bool;

    fn execute(&self) -> Result<()>;

    /// Name used when reporting failures.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Sink for failures caught while running recurring actions
pub trait FailureReporter: Send + Sync {
    fn report(&self, message: &str, error: &anyhow::Error);
}

/// Default reporter: logs every failure at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureReporter;

impl FailureReporter for TracingFailureReporter {
    fn report(&self, message: &str, error: &anyhow::Error) {
        tracing::error!(error = format!("{error:#}"), "{message}");
    }
}
