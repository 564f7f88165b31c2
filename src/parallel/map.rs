use anyhow::Result;

use super::core::{ExecutionConfig, ExecutionStrategy};
use super::pool::WorkerPool;

/// Map `func` over `source`, keeping only the `Some` results
///
/// Sequential mode applies `func` in source order on the calling thread and
/// returns results in that order. Otherwise up to `max_parallelism` workers
/// pull items concurrently and the order of the returned results is
/// unspecified.
///
/// Fail-fast: the first error stops the remaining work and is returned.
pub fn apply<I, T, R, F>(config: &ExecutionConfig, source: I, func: F) -> Result<Vec<R>>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send,
    T: Send,
    R: Send,
    F: Fn(T) -> Result<Option<R>> + Sync,
{
    match ExecutionStrategy::for_config(config) {
        ExecutionStrategy::Sequential => {
            let mut results = Vec::new();
            for item in source {
                if let Some(result) = func(item)? {
                    results.push(result);
                }
            }
            Ok(results)
        }
        ExecutionStrategy::Parallel { workers } => {
            tracing::debug!(workers, database = config.database(), "parallel map");
            WorkerPool::new(workers).execute(source, func)
        }
    }
}
