//! Typed failure conditions surfaced by the executors
//!
//! Every executor returns [`crate::Result`], an `anyhow::Result`. The types here
//! are the conditions a caller may want to tell apart from an ordinary work item
//! failure; recover them with [`anyhow::Error::downcast_ref`].

use std::any::Any;
use thiserror::Error;

/// Cancellation was requested between partitions of an indexed run.
///
/// This is an expected abort, not a failure worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("execution was cancelled")]
pub struct Cancelled;

/// One or more interleaved work items failed.
///
/// Produced only after every admitted item has finished, so the list holds
/// every failure of the run, in completion order.
#[derive(Debug, Error)]
#[error("{} interleaved work item(s) failed", .errors.len())]
pub struct AggregateError {
    errors: Vec<anyhow::Error>,
}

impl AggregateError {
    /// Turn collected failures into a result: `Ok` when there are none.
    pub fn check(errors: Vec<anyhow::Error>) -> crate::Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors }.into())
        }
    }

    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<anyhow::Error> {
        self.errors
    }
}

/// Degenerate executor configuration, rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max parallelism must be at least 1, got {0}")]
    InvalidParallelism(usize),

    #[error("thread percentage must be between 1 and 100, got {0}")]
    InvalidThreadPercentage(u8),

    #[error("scheduler pool could not be built: {0}")]
    SchedulerPool(String),
}

/// Turn a payload caught with `catch_unwind` into an ordinary error.
pub(crate) fn caught_panic(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");
    anyhow::anyhow!("panicked: {message}")
}
