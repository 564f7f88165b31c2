//! Single entry point bundling every execution strategy
//!
//! The indexing subsystem talks to one background task executor. The stateless
//! strategies are plain functions in [`crate::parallel`]; the only state the
//! executor owns is the [`RepeatingActionScheduler`] for recurring actions.

use anyhow::Result;
use std::sync::Arc;

use crate::parallel::{self, Cursor, ExecutionConfig};
use crate::repeat::{RepeatableAction, RepeatingActionScheduler};

#[derive(Clone, Default)]
pub struct TaskExecutor {
    repeating: RepeatingActionScheduler,
}

impl TaskExecutor {
    pub fn new(repeating: RepeatingActionScheduler) -> Self {
        Self { repeating }
    }

    pub fn repeating(&self) -> &RepeatingActionScheduler {
        &self.repeating
    }

    /// See [`parallel::apply`].
    pub fn apply<I, T, R, F>(&self, config: &ExecutionConfig, source: I, func: F) -> Result<Vec<R>>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send,
        T: Send,
        R: Send,
        F: Fn(T) -> Result<Option<R>> + Sync,
    {
        parallel::apply(config, source, func)
    }

    /// See [`RepeatingActionScheduler::repeat`].
    pub fn repeat<A>(&self, action: &Arc<A>) -> Result<()>
    where
        A: RepeatableAction + 'static,
    {
        self.repeating.repeat(action)
    }

    /// See [`parallel::execute_all_buffered`].
    pub fn execute_all_buffered<T, F>(
        &self,
        config: &ExecutionConfig,
        source: &[T],
        action: F,
    ) -> Result<()>
    where
        T: Sync,
        F: Fn(Cursor<'_, T>) -> Result<()> + Sync,
    {
        parallel::execute_all_buffered(config, source, action)
    }

    /// See [`parallel::execute_all`].
    pub fn execute_all<T, F>(&self, config: &ExecutionConfig, source: &[T], action: F) -> Result<()>
    where
        T: Sync,
        F: Fn(&T, usize) -> Result<()> + Sync,
    {
        parallel::execute_all(config, source, action)
    }

    /// See [`parallel::execute_all_interleaved`].
    pub fn execute_all_interleaved<T, F>(
        &self,
        config: &ExecutionConfig,
        items: &[T],
        action: F,
    ) -> Result<()>
    where
        T: Sync,
        F: Fn(&T) -> Result<()> + Sync,
    {
        parallel::execute_all_interleaved(config, items, action)
    }
}
