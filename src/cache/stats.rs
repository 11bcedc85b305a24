//! Cache Statistics Module
//!
//! Tracks where reads were served from and how often maintenance ran.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served by the memory tier
    pub memory_hits: u64,
    /// Reads served by the disk tier (and promoted to memory)
    pub disk_hits: u64,
    /// Reads that found nothing in either tier
    pub misses: u64,
    /// Values accepted by `set`
    pub writes: u64,
    /// Maintenance sweeps triggered by the write counter
    pub sweeps_triggered: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the combined hit rate of both tiers.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.disk_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    // == Record Memory Hit ==
    /// Increments the memory hit counter.
    pub fn record_memory_hit(&mut self) {
        self.memory_hits += 1;
    }

    // == Record Disk Hit ==
    /// Increments the disk hit counter.
    pub fn record_disk_hit(&mut self) {
        self.disk_hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Write ==
    /// Increments the write counter.
    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    // == Record Sweep ==
    /// Increments the triggered sweep counter.
    pub fn record_sweep(&mut self) {
        self.sweeps_triggered += 1;
    }
}
