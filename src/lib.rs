//! Tiercache - A two-tier (memory + disk) key/value cache
//!
//! Values live in a fast memory tier with delegated eviction and are
//! persisted to per-identifier, content-addressed files on disk that are
//! swept by age.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod tasks;

pub use cache::{CacheKey, CacheValue, ClearOption, Json, TieredCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::PendingWrite;
