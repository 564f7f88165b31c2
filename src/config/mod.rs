//! Executor configuration
//!
//! The only setting the executor itself depends on is the maximum number of
//! parallel index tasks, which bounds the fan-out of every strategy. A value
//! of 1 is the documented fully sequential mode used by tests and constrained
//! environments.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. `default-config.toml`, embedded at compile time
//! 2. a custom file given with `--config` (TOML, or JSON by extension), or
//!    `indexing.toml` in the working directory
//! 3. `INDEXING_*` environment variables, e.g. `INDEXING_MAX_PARALLEL_INDEX_TASKS=1`

mod core;

pub use self::core::{ENV_PREFIX, ExecutorSettings};
