use anyhow::Result;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};

use super::core::{ExecutionConfig, ExecutionStrategy};
use super::gate::AdmissionGate;
use crate::diagnostics::DiagnosticScope;
use crate::error::{AggregateError, caught_panic};

/// Run heterogeneous, possibly long-running jobs with bounded concurrency
///
/// An empty input is a no-op and a single item runs on the calling thread,
/// its failure returned as-is. With a parallelism of one every item runs in
/// order on the calling thread.
///
/// Otherwise items are admitted in input order through an [`AdmissionGate`]
/// with `max_parallelism` permits: the caller blocks until a permit is free,
/// then launches the item on the configured scheduler without waiting for it.
/// A finished item, successful or not, gives its permit back. The call
/// returns once every launched item has completed, so at most
/// `max_parallelism` items are ever in flight while completion order is
/// unconstrained.
///
/// Failures never stop other items; they are collected and returned together
/// as an [`AggregateError`] after the last item finishes. A panicking item is
/// collected like any other failure.
///
/// The call may be nested inside work already running on the scheduler's
/// pool: a worker waiting for a permit keeps executing queued jobs instead of
/// parking.
pub fn execute_all_interleaved<T, F>(config: &ExecutionConfig, items: &[T], action: F) -> Result<()>
where
    T: Sync,
    F: Fn(&T) -> Result<()> + Sync,
{
    match items {
        [] => return Ok(()),
        [single] => return action(single),
        _ => {}
    }

    let database = config.database();
    let _diagnostics = DiagnosticScope::enter(database);

    let workers = match ExecutionStrategy::for_config(config) {
        ExecutionStrategy::Sequential => {
            let failures = items.iter().filter_map(|item| action(item).err()).collect();
            return AggregateError::check(failures);
        }
        ExecutionStrategy::Parallel { workers } => workers,
    };

    tracing::debug!(items = items.len(), permits = workers, "interleaved dispatch");

    let gate = AdmissionGate::new(workers);
    let failures = Mutex::new(Vec::new());
    config.scheduler().in_place_scope(|scope| {
        for item in items {
            let permit = gate.acquire_cooperative();
            let (action, failures) = (&action, &failures);
            scope.spawn(move |_| {
                let _permit = permit;
                let _diagnostics = DiagnosticScope::enter(database);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(item)))
                    .unwrap_or_else(|payload| Err(caught_panic(payload)));
                if let Err(err) = outcome {
                    failures.lock().push(err);
                }
            });
        }
    });

    AggregateError::check(failures.into_inner())
}
