//! Tiered Cache Coordinator
//!
//! Owns one memory layer and one disk store and applies the read-through /
//! write-through policy between them. Every public operation runs its state
//! mutations (memory tier, write counter, stats) under a single lock; disk
//! I/O always happens outside it so a slow disk never stalls other callers.
//! Disk mutations are queued to the cache's disk worker while the lock is
//! held, so the disk sees them in the same order as the memory tier.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::cache::{CacheKey, CacheStats, CacheValue, DiskStore, MemoryLayer, SweepReport};
use crate::config::CacheConfig;
use crate::tasks::{spawn_disk_writer, DiskWriter, PendingWrite};

// == Clear Option ==
/// Which tiers `clear` empties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearOption {
    /// Empty the memory tier only; the sweep schedule is untouched
    MemoryOnly,
    /// Delete every file on disk and restart the sweep schedule
    DiskOnly,
    /// Both of the above
    #[default]
    All,
}

/// State serialized across all operations of one cache.
#[derive(Debug)]
struct Shared {
    memory: MemoryLayer,
    /// Writes since the last sweep fired or the disk was cleared
    writes_since_sweep: u64,
    stats: CacheStats,
}

/// Dropping the last handle closes `writer`, which makes the disk worker run
/// a final best-effort sweep.
struct Inner {
    identifier: String,
    state: Mutex<Shared>,
    disk: Arc<DiskStore>,
    writer: DiskWriter,
    sweep_threshold: u64,
}

// == Tiered Cache ==
/// Two-tier key/value cache bound to one identifier.
///
/// Caches opened with the same identifier and root share disk storage and
/// see each other's writes; different identifiers are fully isolated.
/// Cloning yields another handle to the same cache.
pub struct TieredCache<K: ?Sized, V> {
    inner: Arc<Inner>,
    _types: PhantomData<fn(&K) -> V>,
}

impl<K: ?Sized, V> Clone for TieredCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _types: PhantomData,
        }
    }
}

impl<K: ?Sized, V> fmt::Debug for TieredCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache")
            .field("identifier", &self.inner.identifier)
            .field("directory", &self.inner.disk.directory())
            .field("sweep_threshold", &self.inner.sweep_threshold)
            .finish()
    }
}

impl<K, V> TieredCache<K, V>
where
    K: CacheKey + ?Sized,
    V: CacheValue,
{
    // == Constructor ==
    /// Opens the cache for `identifier`, creating its directory if needed and
    /// sweeping stale files.
    ///
    /// If the directory cannot be created the cache still works, memory-only.
    pub async fn open(identifier: impl Into<String>, config: &CacheConfig) -> Self {
        let identifier = identifier.into();
        let disk = DiskStore::open(
            &config.resolve_root(),
            &config.directory_prefix,
            &identifier,
            config.max_age,
        )
        .await;
        disk.sweep(config.max_age).await;
        let disk = Arc::new(disk);
        let (writer, _worker) = spawn_disk_writer(disk.clone());

        info!(
            "Opened cache '{}' (sweep_threshold={}, max_age={}s, degraded={})",
            identifier,
            config.sweep_threshold,
            config.max_age.as_secs(),
            disk.is_degraded()
        );

        Self {
            inner: Arc::new(Inner {
                identifier,
                state: Mutex::new(Shared {
                    memory: MemoryLayer::new(config.memory_capacity),
                    writes_since_sweep: 0,
                    stats: CacheStats::new(),
                }),
                disk,
                writer,
                sweep_threshold: config.sweep_threshold,
            }),
            _types: PhantomData,
        }
    }

    /// Identifier this cache is bound to.
    pub fn identifier(&self) -> &str {
        &self.inner.identifier
    }

    /// Identifier directory on disk, `None` when running memory-only.
    pub fn directory(&self) -> Option<&Path> {
        self.inner.disk.directory()
    }

    // == Get ==
    /// Looks `key` up in memory, then on disk.
    ///
    /// A disk hit is promoted into memory as-is; it is never written back to
    /// disk. Corrupt files are deleted and reported as a miss.
    pub async fn get(&self, key: &K) -> Option<V> {
        let key = key.key_string();

        {
            let mut shared = self.inner.state.lock().await;
            if let Some(bytes) = shared.memory.get(&key) {
                match V::from_bytes(&bytes) {
                    Ok(value) => {
                        shared.stats.record_memory_hit();
                        debug!("Memory hit for '{}'", key);
                        return Some(value);
                    }
                    Err(e) => {
                        // Everything in memory was decodable on the way in
                        error!("Undecodable bytes in memory tier for '{}': {}", key, e);
                        shared.memory.remove(&key);
                    }
                }
            }
        }

        let found = self
            .inner
            .disk
            .read_and_validate(&key, |bytes| {
                V::from_bytes(bytes).map(|value| (value, Arc::<[u8]>::from(bytes)))
            })
            .await;

        let mut shared = self.inner.state.lock().await;
        match found {
            Some((value, bytes)) => {
                // A set that landed while we were reading disk wins
                if !shared.memory.contains_key(&key) {
                    shared.memory.set(key.clone(), bytes);
                }
                shared.stats.record_disk_hit();
                debug!("Disk hit for '{}', promoted to memory", key);
                Some(value)
            }
            None => {
                shared.stats.record_miss();
                debug!("Miss for '{}'", key);
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key`.
    ///
    /// The memory tier holds the value when this returns; the disk write is
    /// queued behind this cache's earlier disk work and can be awaited
    /// through the returned [`PendingWrite`]. Every `sweep_threshold + 1`-th
    /// write also sweeps the disk, after its own file is committed.
    pub async fn set(&self, key: &K, value: &V) -> PendingWrite {
        let key = key.key_string();
        let bytes: Arc<[u8]> = match value.to_bytes() {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                error!("Refusing to cache '{}': {}", key, e);
                return PendingWrite::skipped();
            }
        };

        let mut shared = self.inner.state.lock().await;
        shared.memory.set(key.clone(), bytes.clone());
        shared.stats.record_write();

        let run_maintenance = shared.writes_since_sweep >= self.inner.sweep_threshold;
        if run_maintenance {
            shared.writes_since_sweep = 0;
            shared.stats.record_sweep();
            debug!("Write threshold reached, sweeping after '{}'", key);
        } else {
            shared.writes_since_sweep += 1;
        }

        // Queued under the lock: disk order matches memory order
        self.inner.writer.write(key, bytes, run_maintenance)
    }

    // == Contains ==
    /// Returns true if `key` is resident in memory. Never touches disk.
    pub async fn contains(&self, key: &K) -> bool {
        let key = key.key_string();
        self.inner.state.lock().await.memory.contains_key(&key)
    }

    // == Remove ==
    /// Removes `key` from both tiers, after any queued write for it.
    pub async fn remove(&self, key: &K) {
        let key = key.key_string();
        let pending = {
            let shared = self.inner.state.lock().await;
            shared.memory.remove(&key);
            self.inner.writer.remove(key)
        };
        pending.finished().await;
    }

    // == Clear ==
    /// Empties the tiers selected by `option`.
    ///
    /// Clearing disk waits for every disk write this cache queued before it,
    /// so none of them can resurface afterwards. It also restarts the sweep
    /// schedule; clearing memory alone leaves it as is.
    pub async fn clear(&self, option: ClearOption) {
        let pending = {
            let mut shared = self.inner.state.lock().await;
            if option != ClearOption::DiskOnly {
                shared.memory.remove_all();
            }
            if option != ClearOption::MemoryOnly {
                shared.writes_since_sweep = 0;
                Some(self.inner.writer.clear())
            } else {
                None
            }
        };

        if let Some(pending) = pending {
            pending.finished().await;
        }
        info!("Cleared cache '{}' ({:?})", self.inner.identifier, option);
    }

    /// Empties both tiers, same as `clear(ClearOption::default())`.
    pub async fn clear_all(&self) {
        self.clear(ClearOption::default()).await;
    }

    // == Sweep ==
    /// Runs a maintenance sweep now with the configured max age.
    ///
    /// The write-count schedule is not affected.
    pub async fn sweep(&self) -> SweepReport {
        let disk = &self.inner.disk;
        disk.sweep(disk.max_age()).await
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.inner.state.lock().await.stats.clone()
    }
}
