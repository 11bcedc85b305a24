//! Disk Persistence Worker
//!
//! Every disk mutation of one cache (writes, removals, clears) goes through a
//! single background worker, so they reach the filesystem in the order the
//! cache issued them. Callers are not blocked: by the time `set` returns the
//! memory tier holds the value, while the file may still be queued.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::DiskStore;

// == Disk Command ==
/// Work item handled by the disk worker.
#[derive(Debug)]
enum DiskCommand {
    Write {
        key: String,
        bytes: Arc<[u8]>,
        run_maintenance_after: bool,
        done: oneshot::Sender<()>,
    },
    Remove {
        key: String,
        done: oneshot::Sender<()>,
    },
    Clear {
        done: oneshot::Sender<()>,
    },
}

// == Pending Write ==
/// Handle to queued disk work.
///
/// Dropping it leaves the work running in the background. Await
/// [`PendingWrite::finished`] to know it reached the disk.
#[derive(Debug)]
pub struct PendingWrite {
    done: Option<oneshot::Receiver<()>>,
}

impl PendingWrite {
    /// Work that never reached the disk (nothing to wait for).
    pub(crate) fn skipped() -> Self {
        Self { done: None }
    }

    /// Waits for the disk work (and any sweep it triggered) to complete.
    pub async fn finished(self) {
        if let Some(done) = self.done {
            if done.await.is_err() {
                warn!("Disk worker stopped before completing queued work");
            }
        }
    }
}

// == Disk Writer ==
/// Ordered queue in front of a [`DiskStore`].
#[derive(Debug)]
pub struct DiskWriter {
    sender: mpsc::UnboundedSender<DiskCommand>,
}

impl DiskWriter {
    /// Queues a write of `bytes` for `key`.
    pub fn write(
        &self,
        key: String,
        bytes: Arc<[u8]>,
        run_maintenance_after: bool,
    ) -> PendingWrite {
        let (done, finished) = oneshot::channel();
        self.submit(
            DiskCommand::Write {
                key,
                bytes,
                run_maintenance_after,
                done,
            },
            finished,
        )
    }

    /// Queues deletion of the file for `key`.
    pub fn remove(&self, key: String) -> PendingWrite {
        let (done, finished) = oneshot::channel();
        self.submit(DiskCommand::Remove { key, done }, finished)
    }

    /// Queues deletion of every file. Runs after all previously queued work.
    pub fn clear(&self) -> PendingWrite {
        let (done, finished) = oneshot::channel();
        self.submit(DiskCommand::Clear { done }, finished)
    }

    fn submit(&self, command: DiskCommand, finished: oneshot::Receiver<()>) -> PendingWrite {
        match self.sender.send(command) {
            Ok(()) => PendingWrite {
                done: Some(finished),
            },
            Err(_) => {
                warn!("Disk worker is gone, dropping disk work");
                PendingWrite::skipped()
            }
        }
    }
}

/// Spawns the disk worker for `disk`.
///
/// The worker runs until every [`DiskWriter`] handle is dropped, then makes a
/// best-effort sweep. The runtime may stop first, so that sweep is never
/// guaranteed. Must be called from within a tokio runtime.
pub fn spawn_disk_writer(disk: Arc<DiskStore>) -> (DiskWriter, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        debug!("Disk worker started");

        while let Some(command) = receiver.recv().await {
            match command {
                DiskCommand::Write {
                    key,
                    bytes,
                    run_maintenance_after,
                    done,
                } => {
                    disk.write(&key, &bytes, run_maintenance_after).await;
                    let _ = done.send(());
                }
                DiskCommand::Remove { key, done } => {
                    disk.remove(&key).await;
                    let _ = done.send(());
                }
                DiskCommand::Clear { done } => {
                    disk.clear_all().await;
                    let _ = done.send(());
                }
            }
        }

        let report = disk.sweep(disk.max_age()).await;
        info!("Disk worker stopped, final sweep removed {} files", report.removed);
    });

    (DiskWriter { sender }, handle)
}
