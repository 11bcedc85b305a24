//! Disk Store Module
//!
//! Durable per-identifier storage of serialized values, one file per key,
//! named by the key's content address. File modification time is the entry's
//! age. No operation here ever returns an error to its caller: failures are
//! logged and degrade to a miss or a no-op.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::address::address_for;
use crate::error::{CacheError, Result};

/// Suffix of in-flight temp files, renamed over the final path once written
const TEMP_SUFFIX: &str = ".tmp";

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

// == Sweep Report ==
/// Outcome of a maintenance sweep.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SweepReport {
    /// Files last modified before this instant were eligible for removal
    pub cutoff: DateTime<Utc>,
    /// Files removed
    pub removed: usize,
    /// Files that could not be inspected or removed
    pub failed: usize,
}

impl SweepReport {
    fn empty(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff,
            removed: 0,
            failed: 0,
        }
    }
}

// == Disk Store ==
/// Directory of content-addressed value blobs.
///
/// When the directory could not be created the store is degraded: every
/// operation becomes a no-op or reports absence.
#[derive(Debug, Clone)]
pub struct DiskStore {
    /// `None` in degraded mode
    directory: Option<PathBuf>,
    /// Default age limit used by write-triggered sweeps
    max_age: Duration,
}

impl DiskStore {
    // == Constructor ==
    /// Opens (creating if needed) `<root>/<prefix>-<identifier>`.
    ///
    /// The identifier is used verbatim; no escaping is performed.
    pub async fn open(root: &Path, prefix: &str, identifier: &str, max_age: Duration) -> Self {
        let directory = match prepare_directory(root, prefix, identifier).await {
            Ok(path) => {
                debug!("Disk store ready at {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Disk tier disabled for '{}': {}", identifier, e);
                None
            }
        };
        Self { directory, max_age }
    }

    // == Is Degraded ==
    /// Returns true if the store runs without a directory.
    pub fn is_degraded(&self) -> bool {
        self.directory.is_none()
    }

    // == Directory ==
    /// Identifier directory, `None` in degraded mode.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    // == Max Age ==
    /// Age limit applied by write-triggered sweeps.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| dir.join(address_for(key)))
    }

    // == Exists ==
    /// Returns true if a file exists for `key`. Always false when degraded.
    pub async fn exists(&self, key: &str) -> bool {
        match self.path_for(key) {
            Some(path) => fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }

    // == Read ==
    /// Reads the stored bytes for `key`.
    ///
    /// Missing and unreadable files are both reported as `None`.
    pub async fn read(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    // == Read And Validate ==
    /// Reads `key` and decodes it with `decode`.
    ///
    /// A file that fails to decode is deleted so the corruption is not seen
    /// again. A failed read deletes nothing.
    pub async fn read_and_validate<T, F>(&self, key: &str, decode: F) -> Option<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let bytes = self.read(key).await?;
        match decode(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding corrupt cache entry for '{}': {}", key, e);
                self.remove(key).await;
                None
            }
        }
    }

    // == Write ==
    /// Writes `bytes` for `key`, replacing any previous file.
    ///
    /// Bytes land in a temp file first and are renamed into place, so readers
    /// only ever see a complete value. With `run_maintenance_after` a sweep
    /// using the store's max age follows the write.
    pub async fn write(&self, key: &str, bytes: &[u8], run_maintenance_after: bool) {
        let Some(path) = self.path_for(key) else {
            return;
        };

        if let Err(e) = write_atomic(&path, bytes).await {
            warn!("Failed to write cache file {}: {}", path.display(), e);
        }

        if run_maintenance_after {
            self.sweep(self.max_age).await;
        }
    }

    // == Remove ==
    /// Deletes the file for `key`, if any.
    pub async fn remove(&self, key: &str) {
        let Some(path) = self.path_for(key) else {
            return;
        };
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete cache file {}: {}", path.display(), e),
        }
    }

    // == Clear All ==
    /// Deletes every file directly inside the identifier directory, keeping
    /// the directory itself. Returns the number of files removed.
    pub async fn clear_all(&self) -> usize {
        let Some(dir) = self.directory.as_deref() else {
            return 0;
        };
        let files = match list_files(dir).await {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list cache directory {}: {}", dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        for path in files {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to delete cache file {}: {}", path.display(), e),
            }
        }
        info!("Cleared {} files from {}", removed, dir.display());
        removed
    }

    // == Sweep ==
    /// Deletes files last modified more than `max_age` ago.
    pub async fn sweep(&self, max_age: Duration) -> SweepReport {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(UNIX_EPOCH);
        let mut report = SweepReport::empty(DateTime::<Utc>::from(cutoff));

        let Some(dir) = self.directory.as_deref() else {
            return report;
        };
        let files = match list_files(dir).await {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list cache directory {}: {}", dir.display(), e);
                return report;
            }
        };

        for path in files {
            let modified = match fs::metadata(&path).await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("Failed to stat cache file {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    warn!("Failed to delete stale cache file {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        if report.removed > 0 {
            info!(
                "Disk sweep: removed {} files older than {} from {}",
                report.removed,
                report.cutoff.to_rfc3339(),
                dir.display()
            );
        } else {
            debug!("Disk sweep: nothing older than {}", report.cutoff.to_rfc3339());
        }
        report
    }
}

// == Helpers ==
async fn prepare_directory(root: &Path, prefix: &str, identifier: &str) -> Result<PathBuf> {
    let path = root.join(format!("{}-{}", prefix, identifier));
    fs::create_dir_all(&path)
        .await
        .map_err(|source| CacheError::DirectoryUnavailable {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Lists regular files directly inside `dir`.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(kind) if kind.is_dir() => {}
            Ok(_) => files.push(entry.path()),
            Err(e) => warn!("Failed to inspect {}: {}", entry.path().display(), e),
        }
    }
    Ok(files)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(
        ".{}.{}-{}{}",
        file_name,
        std::process::id(),
        TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        TEMP_SUFFIX
    ));

    if let Err(e) = fs::write(&temp, bytes).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e.into());
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    async fn open_store(root: &TempDir) -> DiskStore {
        DiskStore::open(root.path(), "tiercache", "img", HOUR).await
    }

    fn age_file(path: &Path, age: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_open_creates_prefixed_directory() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;

        assert!(!store.is_degraded());
        let dir = store.directory().unwrap();
        assert_eq!(dir, root.path().join("tiercache-img"));
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_open_same_identifier_reuses_directory() {
        let root = TempDir::new().unwrap();
        let first = open_store(&root).await;
        let second = open_store(&root).await;

        assert_eq!(first.directory(), second.directory());
        assert_eq!(file_count(root.path()), 1);
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;

        store.write("a", &[1, 2, 3], false).await;

        assert!(store.exists("a").await);
        assert_eq!(store.read("a").await, Some(vec![1, 2, 3]));
        let file = store.directory().unwrap().join(address_for("a"));
        assert_eq!(std::fs::read(file).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_write_overwrites_and_leaves_no_temp_files() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;

        store.write("a", b"first", false).await;
        store.write("a", b"second", false).await;

        assert_eq!(store.read("a").await, Some(b"second".to_vec()));
        assert_eq!(file_count(store.directory().unwrap()), 1);
    }

    #[tokio::test]
    async fn test_read_missing() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;

        assert!(!store.exists("missing").await);
        assert_eq!(store.read("missing").await, None);
    }

    #[tokio::test]
    async fn test_read_and_validate_deletes_corrupt_file() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;
        store.write("a", b"garbage", false).await;

        let result = store
            .read_and_validate("a", |_| -> Result<u32> {
                Err(CacheError::Deserialization("bad".to_string()))
            })
            .await;

        assert!(result.is_none());
        assert!(!store.exists("a").await);
    }

    #[tokio::test]
    async fn test_read_and_validate_keeps_valid_file() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;
        store.write("a", &[7], false).await;

        let result = store.read_and_validate("a", |b| Ok(b[0])).await;

        assert_eq!(result, Some(7));
        assert!(store.exists("a").await);
    }

    #[tokio::test]
    async fn test_remove() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;
        store.write("a", b"1", false).await;
        store.write("b", b"2", false).await;

        store.remove("a").await;
        store.remove("never-written").await;

        assert!(!store.exists("a").await);
        assert!(store.exists("b").await);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_directory() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;
        store.write("a", b"1", false).await;
        store.write("b", b"2", false).await;

        let removed = store.clear_all().await;

        assert_eq!(removed, 2);
        let dir = store.directory().unwrap();
        assert!(dir.is_dir());
        assert_eq!(file_count(dir), 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_old_files() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;
        store.write("old", b"1", false).await;
        store.write("fresh", b"2", false).await;
        age_file(&store.directory().unwrap().join(address_for("old")), 2 * HOUR);

        let report = store.sweep(HOUR).await;

        assert_eq!(report.removed, 1);
        assert_eq!(report.failed, 0);
        assert!(!store.exists("old").await);
        assert!(store.exists("fresh").await);
    }

    #[tokio::test]
    async fn test_write_with_maintenance_sweeps_after_commit() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root).await;
        store.write("old", b"1", false).await;
        age_file(&store.directory().unwrap().join(address_for("old")), 2 * HOUR);

        store.write("new", b"2", true).await;

        assert!(!store.exists("old").await);
        assert!(store.exists("new").await);
    }

    #[tokio::test]
    async fn test_degraded_store_is_noop() {
        let root = TempDir::new().unwrap();
        // A regular file where the root directory should be
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let store = DiskStore::open(&blocker, "tiercache", "img", HOUR).await;
        assert!(store.is_degraded());
        assert!(store.directory().is_none());

        store.write("a", b"1", true).await;
        assert!(!store.exists("a").await);
        assert_eq!(store.read("a").await, None);
        assert_eq!(store.clear_all().await, 0);
        assert_eq!(store.sweep(HOUR).await.removed, 0);
    }

    #[tokio::test]
    async fn test_open_creates_missing_parents() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");

        let store = DiskStore::open(&nested, "tiercache", "img", HOUR).await;

        assert!(!store.is_degraded());
        assert!(nested.join("tiercache-img").is_dir());
    }

    #[tokio::test]
    async fn test_list_files_missing_dir_is_io_error() {
        let root = TempDir::new().unwrap();
        let err = list_files(&root.path().join("gone")).await.unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
    }

    #[tokio::test]
    async fn test_write_atomic_missing_dir_is_io_error() {
        let root = TempDir::new().unwrap();
        let target = root.path().join("gone").join("entry");

        let err = write_atomic(&target, b"1").await.unwrap_err();

        assert!(matches!(err, CacheError::Io(_)));
        assert!(!root.path().join("gone").exists());
    }
}
