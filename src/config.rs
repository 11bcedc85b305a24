//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_DIRECTORY_PREFIX, DEFAULT_MAX_AGE_SECS, DEFAULT_SWEEP_THRESHOLD};

/// Default memory tier budget in bytes (64 MiB)
pub const DEFAULT_MEMORY_CAPACITY: u64 = 64 * 1024 * 1024;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The sweep threshold and max age were tuned for one image-heavy workload and
/// should be revisited for others.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory holding one subdirectory per identifier.
    /// `None` resolves to the platform cache directory.
    pub root_dir: Option<PathBuf>,
    /// Prefix of each identifier directory (`<prefix>-<identifier>`)
    pub directory_prefix: String,
    /// Number of writes between two maintenance sweeps
    pub sweep_threshold: u64,
    /// Files older than this are removed by a sweep
    pub max_age: Duration,
    /// Memory tier budget in bytes, eviction beyond it is up to the memory layer
    pub memory_capacity: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TIERCACHE_ROOT` - Root cache directory (default: platform cache dir)
    /// - `TIERCACHE_PREFIX` - Identifier directory prefix (default: "tiercache")
    /// - `TIERCACHE_SWEEP_THRESHOLD` - Writes between sweeps (default: 100)
    /// - `TIERCACHE_MAX_AGE_SECS` - Max file age in seconds (default: 3600)
    /// - `TIERCACHE_MEMORY_CAPACITY` - Memory tier budget in bytes (default: 64 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root_dir: env::var("TIERCACHE_ROOT").ok().map(PathBuf::from),
            directory_prefix: env::var("TIERCACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.directory_prefix),
            sweep_threshold: env::var("TIERCACHE_SWEEP_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_threshold),
            max_age: env::var("TIERCACHE_MAX_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_age),
            memory_capacity: env::var("TIERCACHE_MEMORY_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_capacity),
        }
    }

    /// Returns a config rooted at `root`, everything else default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root.into()),
            ..Self::default()
        }
    }

    /// Resolves the root cache directory.
    pub fn resolve_root(&self) -> PathBuf {
        match &self.root_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir().unwrap_or_else(env::temp_dir),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            directory_prefix: DEFAULT_DIRECTORY_PREFIX.to_string(),
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}
