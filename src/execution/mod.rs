//! Execution module.
//!
//! The tiled executor that parallelizes tileable operations, and the
//! per-index output cache layer chains memoize into.

pub mod cache;
pub mod executor;

pub use cache::{CacheStats, OutputCache};
pub use executor::{Band, ExecutionStats, SharedExecutor, TiledExecutor};
