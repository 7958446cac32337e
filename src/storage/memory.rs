//! In-memory backing store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{check_quota, used_bytes, Storage, StorageResult};

// == Memory Storage ==
/// Process-local store backed by a shared `HashMap`.
///
/// Cloning yields another handle onto the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Creates an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Arc::default(),
            quota: Some(quota_bytes),
        }
    }

    /// Returns true if a raw item exists at `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.read().contains_key(key)
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        used_bytes(&self.items.read())
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write();
        check_quota(&items, self.quota, key, value)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().remove(key);
        Ok(())
    }
}
