//! Content Address Module
//!
//! Maps a key's string form to a fixed-length, filesystem-safe file name.

use sha2::{Digest, Sha256};

/// Length of every content address (hex-encoded SHA-256)
pub const ADDRESS_LENGTH: usize = 64;

// == Address For ==
/// Returns the lowercase hex SHA-256 of the UTF-8 bytes of `key`.
pub fn address_for(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}
