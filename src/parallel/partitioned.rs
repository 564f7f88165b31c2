use anyhow::Result;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};

use super::core::{ExecutionConfig, ExecutionStrategy};
use crate::diagnostics::DiagnosticScope;
use crate::error::caught_panic;

/// Run `action` on every item together with its original position
///
/// Intended for small sources, on the order of the number of indexes rather
/// than the number of documents.
///
/// Sequential mode walks the source in order on the calling thread. Otherwise
/// the source is cut into consecutive partitions of `max_parallelism` items.
/// Partitions run one after another; the items of a partition run concurrently
/// on the configured scheduler, each inside a diagnostic scope carrying the
/// database identity. An item's index is the number of items in all earlier
/// partitions plus its position in its own partition.
///
/// Cancellation is checked before the first partition and before each
/// following one; an in-flight partition always completes. A cancelled run
/// returns [`crate::error::Cancelled`]. An item failure lets its partition
/// finish, then the first failure is returned and no further partition starts.
/// A panicking item counts as a failure.
pub fn execute_all<T, F>(config: &ExecutionConfig, source: &[T], action: F) -> Result<()>
where
    T: Sync,
    F: Fn(&T, usize) -> Result<()> + Sync,
{
    let workers = match ExecutionStrategy::for_config(config) {
        ExecutionStrategy::Sequential => {
            for (index, item) in source.iter().enumerate() {
                action(item, index)?;
            }
            return Ok(());
        }
        ExecutionStrategy::Parallel { workers } => workers,
    };

    config.cancellation().check()?;

    let database = config.database();
    let mut start = 0;
    for partition in source.chunks(workers) {
        if let Err(cancelled) = config.cancellation().check() {
            tracing::debug!(completed = start, total = source.len(), "indexed run cancelled");
            return Err(cancelled.into());
        }

        tracing::trace!(start, len = partition.len(), "running partition");
        let failure = Mutex::new(None);
        config.scheduler().in_place_scope(|scope| {
            for (position, item) in partition.iter().enumerate() {
                let index = start + position;
                let (action, failure) = (&action, &failure);
                scope.spawn(move |_| {
                    let _diagnostics = DiagnosticScope::enter(database);
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(item, index)))
                        .unwrap_or_else(|payload| Err(caught_panic(payload)));
                    if let Err(err) = outcome {
                        failure.lock().get_or_insert(err);
                    }
                });
            }
        });

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        start += partition.len();
    }

    Ok(())
}
