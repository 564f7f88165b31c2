//! Grouped periodic execution of background maintenance actions
//!
//! Actions are grouped by their repeat interval and every group shares a
//! single timer. Each tick runs every valid member of the group, drops members
//! that became invalid, and isolates failures: an action that errors or panics
//! is reported through a [`FailureReporter`] and never prevents its siblings,
//! or later ticks, from running.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use indexing_executor::repeat::{ManualTimerFactory, RepeatableAction, RepeatingActionScheduler};
//!
//! struct Flush(AtomicUsize);
//!
//! impl RepeatableAction for Flush {
//!     fn repeat_interval(&self) -> Duration { Duration::from_secs(30) }
//!     fn is_valid(&self) -> bool { true }
//!     fn execute(&self) -> anyhow::Result<()> {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! let timers = ManualTimerFactory::new();
//! let scheduler = RepeatingActionScheduler::new(timers.clone());
//! let flush = Arc::new(Flush(AtomicUsize::new(0)));
//!
//! scheduler.repeat(&flush)?;
//! timers.fire(Duration::from_secs(30));
//! assert_eq!(flush.0.load(Ordering::SeqCst), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod action;
pub mod scheduler;
pub mod timer;

pub use action::{FailureReporter, RepeatableAction, TracingFailureReporter};
pub use scheduler::RepeatingActionScheduler;
pub use timer::{ManualTimerFactory, ThreadTimerFactory, TickFn, TimerFactory, TimerHandle};
