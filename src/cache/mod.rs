//! Cache Module
//!
//! Two-tier caching: a memory layer with delegated eviction in front of a
//! content-addressed disk store with age-based sweeps.

mod address;
mod coordinator;
mod disk;
mod memory;
mod stats;
mod value;


// Re-export public types
pub use address::{address_for, ADDRESS_LENGTH};
pub use coordinator::{ClearOption, TieredCache};
pub use disk::{DiskStore, SweepReport};
pub use memory::MemoryLayer;
pub use stats::CacheStats;
pub use value::{CacheKey, CacheValue, Json};

// == Public Constants ==
/// Writes between two write-triggered disk sweeps
pub const DEFAULT_SWEEP_THRESHOLD: u64 = 100;

/// Age in seconds after which a disk entry is swept
pub const DEFAULT_MAX_AGE_SECS: u64 = 60 * 60;

/// Prefix of every identifier directory
pub const DEFAULT_DIRECTORY_PREFIX: &str = "tiercache";
