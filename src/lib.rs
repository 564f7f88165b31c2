//! # Indexing Executor
//!
//! The concurrency core behind a document database's indexing subsystem.
//! Background indexing work goes through one of five strategies:
//!
//! - **Parallel map** ([`parallel::apply`]): transform and filter a source,
//!   order preserved in sequential mode only
//! - **Recurring actions** ([`repeat::RepeatingActionScheduler`]): one shared
//!   timer per interval, invalid actions pruned on every tick
//! - **Buffered partitions** ([`parallel::execute_all_buffered`]): hand out
//!   cursors over fixed-size buffers of the source
//! - **Indexed partitions** ([`parallel::execute_all`]): small sources, item
//!   positions preserved, cancellable between partitions
//! - **Bounded interleaving** ([`parallel::execute_all_interleaved`]): at most
//!   `max_parallelism` items in flight, every failure collected
//!
//! [`TaskExecutor`] bundles them behind one handle. Process-wide defaults come
//! from [`ExecutorSettings`].
//!
//! ## Quick Start
//!
//! ```rust
//! use indexing_executor::TaskExecutor;
//! use indexing_executor::parallel::ExecutionConfig;
//!
//! let executor = TaskExecutor::default();
//! let config = ExecutionConfig::new(4)?.with_database("orders");
//!
//! executor.execute_all(&config, &["by-date", "by-customer"], |index, position| {
//!     tracing::info!(index, position, "rebuilding");
//!     Ok(())
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
mod executor;
pub mod parallel;
pub mod repeat;

pub use cli::{Cli, Output};
pub use config::ExecutorSettings;
pub use executor::TaskExecutor;

/// Result type alias for executor operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
