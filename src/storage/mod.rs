//! Storage Module
//!
//! Backing stores the cache writes its serialized entries into. A store is a
//! passive string container; encoding and expiration live in the cache.

mod file;
mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StorageError;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Result type for backing store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// == Public Constants ==
/// Typical per-origin quota of browser local storage (5 MiB)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// == Storage Trait ==
/// Synchronous, string-keyed key/value store.
///
/// Implementations serialize access to the same key internally; callers get
/// no atomicity across separate calls.
pub trait Storage {
    /// Returns the raw string stored at `key`, if any.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes `value` at `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key succeeds.
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

// == Quota Accounting ==
/// Bytes used by all keys and values.
pub(crate) fn used_bytes(items: &HashMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Rejects a write that would push the store past `quota`.
///
/// Replacing an existing key only counts the difference in value size.
pub(crate) fn check_quota(
    items: &HashMap<String, String>,
    quota: Option<usize>,
    key: &str,
    value: &str,
) -> StorageResult<()> {
    let Some(quota) = quota else {
        return Ok(());
    };

    let current = used_bytes(items);
    let needed = match items.get(key) {
        Some(old) => current - old.len() + value.len(),
        None => current + key.len() + value.len(),
    };

    if needed > quota {
        return Err(StorageError::QuotaExceeded { needed, quota });
    }
    Ok(())
}
