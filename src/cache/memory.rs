//! Memory Layer Module
//!
//! Fast in-process tier keyed by the key's string form and holding
//! serialized bytes. Eviction is left entirely to moka (size-weighted
//! TinyLFU); callers must not assume any entry survives.

use std::sync::Arc;

use moka::sync::Cache;

// == Memory Layer ==
/// Byte-weighted in-memory store with externally managed eviction.
#[derive(Clone)]
pub struct MemoryLayer {
    entries: Cache<String, Arc<[u8]>>,
}

impl MemoryLayer {
    // == Constructor ==
    /// Creates a memory layer holding roughly `capacity_bytes` of values.
    pub fn new(capacity_bytes: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity_bytes)
            .weigher(|key: &String, value: &Arc<[u8]>| {
                (key.len() + value.len()).try_into().unwrap_or(u32::MAX)
            })
            .build();
        Self { entries }
    }

    // == Get ==
    /// Returns the stored bytes for `key`, if still resident.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        self.entries.get(key)
    }

    // == Set ==
    /// Stores `bytes` under `key`, replacing any previous entry.
    pub fn set(&self, key: String, bytes: Arc<[u8]>) {
        self.entries.insert(key, bytes);
    }

    // == Remove ==
    /// Drops the entry for `key`, if resident.
    pub fn remove(&self, key: &str) {
        self.entries.invalidate(key);
    }

    // == Remove All ==
    /// Drops every entry. Later reads miss even before moka's cleanup runs.
    pub fn remove_all(&self) {
        self.entries.invalidate_all();
    }

    // == Contains Key ==
    /// Returns true if `key` is resident, without touching its popularity.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl std::fmt::Debug for MemoryLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLayer")
            .field("entry_count", &self.entries.entry_count())
            .finish()
    }
}
