//! Command implementations for the indexing executor CLI
//!
//! Each command lives in its own module.

pub mod config;
pub mod repeat;
pub mod run;
