use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::diagnostics::SYSTEM_DATABASE;
use crate::error::{Cancelled, ConfigError};

/// Cooperative cancellation signal shared between a caller and its executors
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Checkpoint: `Err(Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handle to the thread pool concurrent branches are launched on
///
/// Cloning is cheap; clones share the same pool. The default handle targets
/// rayon's global pool.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Scheduler {
    /// Scheduler backed by rayon's global pool
    pub fn global() -> Self {
        Self::default()
    }

    /// Scheduler backed by a dedicated pool of `threads` named workers
    pub fn new(threads: usize) -> crate::Result<Self> {
        if threads == 0 {
            return Err(ConfigError::InvalidParallelism(threads).into());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("index-worker-{index}"))
            .build()
            .map_err(|e| ConfigError::SchedulerPool(e.to_string()))?;

        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Run `op` on the calling thread with a scope whose spawned jobs execute
    /// on this scheduler's pool. Returns once every spawned job has finished.
    pub fn in_place_scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R,
    {
        match &self.pool {
            Some(pool) => pool.in_place_scope(op),
            None => rayon::in_place_scope(op),
        }
    }
}

/// Read-only settings supplied with every executor call
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    max_parallelism: usize,
    cancellation: CancellationToken,
    scheduler: Scheduler,
    database: Option<String>,
}

impl ExecutionConfig {
    /// Fails fast on a parallelism of zero.
    pub fn new(max_parallelism: usize) -> crate::Result<Self> {
        if max_parallelism == 0 {
            return Err(ConfigError::InvalidParallelism(max_parallelism).into());
        }

        Ok(Self {
            max_parallelism,
            cancellation: CancellationToken::new(),
            scheduler: Scheduler::global(),
            database: None,
        })
    }

    /// Strictly sequential, in-caller-thread configuration
    pub fn sequential() -> Self {
        Self {
            max_parallelism: 1,
            cancellation: CancellationToken::new(),
            scheduler: Scheduler::global(),
            database: None,
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Database identity for diagnostics, falling back to [`SYSTEM_DATABASE`].
    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or(SYSTEM_DATABASE)
    }

    pub fn is_sequential(&self) -> bool {
        self.max_parallelism == 1
    }
}

/// Execution strategy selected from an [`ExecutionConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    /// A parallelism of exactly one is the sequential escape hatch; anything
    /// else fans out to that many workers.
    pub fn for_config(config: &ExecutionConfig) -> Self {
        if config.is_sequential() {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel {
                workers: config.max_parallelism(),
            }
        }
    }

    /// Calculate optimal workers based on available system resources and configuration limits
    ///
    /// # Algorithm
    /// ```text
    /// 1. Detect available CPU cores: num_cpus::get()
    /// 2. Apply percentage: cores * thread_percentage / 100
    /// 3. Apply config limit: min(max_threads_config, percentage_result) if max_threads_config > 0
    /// 4. Ensure minimum: max(1, final_result)
    /// ```
    ///
    /// # Examples
    /// ```rust
    /// use indexing_executor::parallel::ExecutionStrategy;
    ///
    /// let workers = ExecutionStrategy::calculate_optimal_workers(0, 75);
    /// assert!(workers >= 1);
    ///
    /// let workers = ExecutionStrategy::calculate_optimal_workers(8, 75);
    /// assert!(workers <= 8);
    /// ```
    pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
        let available_cores = num_cpus::get();

        let workers_by_percentage =
            std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

        if max_threads_config > 0 {
            std::cmp::min(max_threads_config, workers_by_percentage)
        } else {
            workers_by_percentage
        }
    }
}
