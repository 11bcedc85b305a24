//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror. None of these errors
//! cross the public cache operations: they are produced internally, logged,
//! and turned into a miss or a no-op.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the tiered cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The root or identifier directory could not be created
    #[error("Cache directory unavailable at {}: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value failed to produce its byte form
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Stored bytes could not be decoded into a value
    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    /// Filesystem read, write, delete or listing failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the tiered cache.
pub type Result<T> = std::result::Result<T, CacheError>;
