//! Execution strategies for indexing work
//!
//! This module decides **how** a batch of work is spread across threads. It
//! never decides what the work is: callers hand in the items and a closure.
//!
//! # Strategies
//!
//! | Workload                                   | Entry point                  |
//! |--------------------------------------------|------------------------------|
//! | Simple map with filtering                  | [`apply`]                    |
//! | Large document batches                     | [`execute_all_buffered`]     |
//! | Small sets (indexes) needing positions     | [`execute_all`]              |
//! | Long-running heterogeneous jobs            | [`execute_all_interleaved`]  |
//!
//! Recurring background actions live in [`crate::repeat`].
//!
//! Every entry point takes an [`ExecutionConfig`]. A `max_parallelism` of 1 is
//! the sequential escape hatch: every strategy then runs its items in input
//! order on the calling thread, which keeps tests and constrained
//! environments deterministic.
//!
//! # Failure behaviour
//!
//! - [`apply`], [`execute_all_buffered`] and [`execute_all`] fail fast and
//!   return the first failure.
//! - [`execute_all_interleaved`] lets every admitted item finish and reports
//!   all failures together.
//! - Only [`execute_all`] checks the cancellation token, between partitions.
//!
//! # Example Usage
//!
//! ```rust
//! use indexing_executor::parallel::{self, ExecutionConfig};
//!
//! let config = ExecutionConfig::new(4)?.with_database("orders");
//! let lengths = parallel::apply(&config, vec!["a", "bb", ""], |s: &str| {
//!     Ok((!s.is_empty()).then_some(s.len()))
//! })?;
//! assert_eq!(lengths.len(), 2);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod buffered;
pub mod core;
pub mod gate;
pub mod interleaved;
pub mod map;
pub mod partitioned;
mod pool;

// Re-export main types for easier access
pub use buffered::{BUFFER_SIZE, Cursor, execute_all_buffered};
pub use self::core::{CancellationToken, ExecutionConfig, ExecutionStrategy, Scheduler};
pub use gate::{AdmissionGate, Permit};
pub use interleaved::execute_all_interleaved;
pub use map::apply;
pub use partitioned::execute_all;
