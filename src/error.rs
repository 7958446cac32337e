//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Storage Error Enum ==
/// Failures reported by a backing store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Write rejected because the store would exceed its byte quota
    #[error("Quota exceeded: needed {needed} bytes, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Store is disabled or cannot be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Underlying file operation failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted document could not be parsed
    #[error("Storage document corrupted: {0}")]
    Corrupted(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Expired and malformed entries never show up here; `get` reports both as
/// `Ok(None)`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing store rejected or failed an operation
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Payload could not be encoded as JSON
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
