//! Key and Value Capabilities
//!
//! Keys need a stable string form; values need a byte form they can be
//! rebuilt from.

use std::fmt::Display;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

// == Cache Key ==
/// A key with a deterministic string representation.
///
/// The string form must be identical across process restarts, otherwise
/// entries persisted by a previous run can never be found again.
pub trait CacheKey {
    /// Returns the canonical string form of the key.
    fn key_string(&self) -> String;
}

impl<T: Display + ?Sized> CacheKey for T {
    fn key_string(&self) -> String {
        self.to_string()
    }
}

// == Cache Value ==
/// A value that can be turned into bytes and rebuilt from them.
pub trait CacheValue: Sized {
    /// Serializes the value.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Rebuilds a value from bytes produced by [`CacheValue::to_bytes`].
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// Raw bytes are their own serialization.
impl CacheValue for Vec<u8> {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl CacheValue for String {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

// == Json ==
/// Stores any serde type as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwraps the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize + DeserializeOwned> CacheValue for Json<T> {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map(Json)
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}
