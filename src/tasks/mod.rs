//! Background Tasks Module
//!
//! Detached work spawned on behalf of the cache.
//!
//! # Tasks
//! - Disk worker: applies one cache's writes, removals and clears in order,
//!   then sweeps once when the cache is dropped

mod persist;

pub use persist::{spawn_disk_writer, DiskWriter, PendingWrite};
