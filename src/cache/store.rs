//! Cache Store Module
//!
//! The expiring cache: serializes entries with an absolute expiration time
//! into a backing store and lazily purges them once stale.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, NAMESPACE_SEPARATOR};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::storage::{FileStorage, Storage};

/// Outcome of reading one key from the backing store.
enum Lookup<T> {
    Live(CacheEntry<T>),
    Missing,
    Expired,
    Corrupted,
}

// == Expiring Cache ==
/// TTL-bounded cache over a string key/value store.
///
/// Readers only ever see "present" or "absent": expired and malformed
/// entries are removed from the store and reported as `None`. Backing store
/// failures are returned as errors.
#[derive(Debug)]
pub struct ExpiringCache<S, C = SystemClock> {
    /// Backing store owning the serialized entries
    storage: S,
    /// Time source for expiration
    clock: C,
    /// Optional prefix applied to every key
    namespace: Option<String>,
    /// TTL used by `save_default`
    default_ttl_ms: u64,
    stats: Mutex<CacheStats>,
}

impl<S: Storage> ExpiringCache<S, SystemClock> {
    // == Constructor ==
    /// Creates a cache over `storage` using the wall clock.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl ExpiringCache<Arc<FileStorage>, SystemClock> {
    /// Opens a file-backed cache from configuration.
    ///
    /// Caches built from configs naming the same file share one store
    /// handle, so different namespaces on one path see each other's writes.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let storage = FileStorage::open_shared(&config.storage_path, config.quota_bytes)?;

        let mut cache = Self::new(storage).with_default_ttl(config.default_ttl_ms);
        if let Some(namespace) = &config.namespace {
            cache = cache.with_namespace(namespace.clone());
        }

        info!(
            "Cache initialized: path={}, default_ttl={}ms, namespace={:?}",
            config.storage_path.display(),
            config.default_ttl_ms,
            config.namespace
        );
        Ok(cache)
    }
}

impl<S: Storage, C: Clock> ExpiringCache<S, C> {
    /// Creates a cache over `storage` reading time from `clock`.
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            namespace: None,
            default_ttl_ms: CacheConfig::default().default_ttl_ms,
            stats: Mutex::new(CacheStats::new()),
        }
    }

    /// Prefixes every key with `namespace` and a `:` separator.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the TTL used by `save_default`.
    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    /// The backing store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// TTL in milliseconds used by `save_default`.
    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    /// Key actually used in the backing store for `key`.
    pub fn storage_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match &self.namespace {
            Some(ns) => Cow::Owned(format!("{}{}{}", ns, NAMESPACE_SEPARATOR, key)),
            None => Cow::Borrowed(key),
        }
    }

    // == Save ==
    /// Stores `value` under `key` for `ttl_ms` milliseconds from now.
    ///
    /// Any previous entry at `key` is overwritten.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_ms: u64) -> Result<()> {
        let entry = CacheEntry::new(value, ttl_ms, self.clock.now_ms());
        let encoded = entry.encode()?;

        let storage_key = self.storage_key(key);
        self.storage.set_item(&storage_key, &encoded)?;

        self.stats.lock().record_write();
        debug!("Saved '{}' until {}", storage_key, entry.expires_at);
        Ok(())
    }

    /// Stores `value` under `key` using the default TTL.
    pub fn save_default<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.save(key, value, self.default_ttl_ms)
    }

    // == Get ==
    /// Returns the value at `key` if present, well-formed and unexpired.
    ///
    /// Expired entries and entries that do not decode as `T` are removed
    /// from the store and reported as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let lookup = self.lookup::<T>(key)?;

        let mut stats = self.stats.lock();
        match lookup {
            Lookup::Live(entry) => {
                stats.record_hit();
                debug!("Cache hit for '{}'", key);
                Ok(Some(entry.value))
            }
            Lookup::Missing => {
                stats.record_miss();
                debug!("Cache miss for '{}'", key);
                Ok(None)
            }
            Lookup::Expired => {
                stats.record_expired();
                Ok(None)
            }
            Lookup::Corrupted => {
                stats.record_corrupted();
                Ok(None)
            }
        }
    }

    // == Time To Live ==
    /// Remaining lifetime of the entry at `key` in milliseconds.
    ///
    /// Applies the same purge rules as `get`, checking only the entry shape.
    pub fn ttl_remaining(&self, key: &str) -> Result<Option<u64>> {
        let now = self.clock.now_ms();
        match self.lookup::<serde_json::Value>(key)? {
            Lookup::Live(entry) => Ok(Some(entry.ttl_remaining_ms(now))),
            _ => Ok(None),
        }
    }

    // == Clear ==
    /// Removes `key` from the store. Clearing a missing key is a no-op.
    pub fn clear(&self, key: &str) -> Result<()> {
        let storage_key = self.storage_key(key);
        self.storage.remove_item(&storage_key)?;

        self.stats.lock().record_clear();
        debug!("Cleared '{}'", storage_key);
        Ok(())
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Lookup<T>> {
        let storage_key = self.storage_key(key);
        let Some(raw) = self.storage.get_item(&storage_key)? else {
            return Ok(Lookup::Missing);
        };

        let Some(entry) = CacheEntry::<T>::decode(&raw) else {
            warn!("Purging malformed entry at '{}'", storage_key);
            self.purge(&storage_key);
            return Ok(Lookup::Corrupted);
        };

        let now = self.clock.now_ms();
        if entry.is_expired(now) {
            debug!(
                "Purging '{}', expired at {} (now {})",
                storage_key, entry.expires_at, now
            );
            self.purge(&storage_key);
            return Ok(Lookup::Expired);
        }

        Ok(Lookup::Live(entry))
    }

    /// Best-effort removal of a stale entry; the read reports absent either way.
    fn purge(&self, storage_key: &str) {
        if let Err(e) = self.storage.remove_item(storage_key) {
            warn!("Failed to purge '{}': {}", storage_key, e);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{CacheError, StorageError};
    use crate::storage::{MemoryStorage, StorageResult};
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        id: u32,
    }

    fn test_cache() -> (ExpiringCache<MemoryStorage, ManualClock>, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(0);
        let cache = ExpiringCache::with_clock(storage.clone(), clock.clone());
        (cache, storage, clock)
    }

    #[test]
    fn test_save_and_get() {
        let (cache, _, _) = test_cache();

        cache.save("greeting", "hello", 1000).unwrap();
        let value: Option<String> = cache.get("greeting").unwrap();

        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[test]
    fn test_get_missing() {
        let (cache, _, _) = test_cache();

        let value: Option<u32> = cache.get("missing").unwrap();
        assert!(value.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_session_scenario() {
        let (cache, storage, clock) = test_cache();

        cache.save("session", &Session { id: 42 }, 1000).unwrap();

        clock.set(500);
        assert_eq!(cache.get::<Session>("session").unwrap(), Some(Session { id: 42 }));

        clock.set(1500);
        assert_eq!(cache.get::<Session>("session").unwrap(), None);
        assert!(!storage.contains_key("session"));
    }

    #[test]
    fn test_expiry_boundary() {
        let (cache, storage, clock) = test_cache();

        cache.save("k", &1u8, 100).unwrap();

        clock.set(100);
        assert_eq!(cache.get::<u8>("k").unwrap(), Some(1));

        clock.set(101);
        assert_eq!(cache.get::<u8>("k").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_zero_ttl() {
        let (cache, _, clock) = test_cache();

        cache.save("k", &1u8, 0).unwrap();
        assert_eq!(cache.get::<u8>("k").unwrap(), Some(1));

        clock.advance(1);
        assert_eq!(cache.get::<u8>("k").unwrap(), None);
    }

    #[test]
    fn test_overwrite_uses_latest_ttl() {
        let (cache, _, clock) = test_cache();

        cache.save("k", "v1", 10_000).unwrap();
        cache.save("k", "v2", 100).unwrap();
        assert_eq!(cache.get::<String>("k").unwrap().as_deref(), Some("v2"));

        clock.set(200);
        assert_eq!(cache.get::<String>("k").unwrap(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (cache, storage, _) = test_cache();

        cache.save("k", "v", 1000).unwrap();
        cache.clear("k").unwrap();
        cache.clear("k").unwrap();

        assert!(cache.get::<String>("k").unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupted_entry_purged() {
        let (cache, storage, _) = test_cache();

        storage.set_item("k", "{not valid").unwrap();
        assert!(cache.get::<String>("k").unwrap().is_none());
        assert!(!storage.contains_key("k"));
        assert_eq!(cache.stats().corrupted, 1);
    }

    #[test]
    fn test_entry_without_value_purged_for_option_payload() {
        let (cache, storage, _) = test_cache();

        storage.set_item("k", r#"{"expiresAt": 99999}"#).unwrap();
        assert_eq!(cache.get::<Option<u32>>("k").unwrap(), None);
        assert!(!storage.contains_key("k"));
        assert_eq!(cache.stats().corrupted, 1);

        cache.save("k", &None::<u32>, 1000).unwrap();
        assert_eq!(cache.get::<Option<u32>>("k").unwrap(), Some(None));
    }

    #[test]
    fn test_type_mismatch_fails_closed() {
        let (cache, storage, _) = test_cache();

        cache.save("k", "not a number", 1000).unwrap();
        assert!(cache.get::<u32>("k").unwrap().is_none());
        assert!(!storage.contains_key("k"));
    }

    #[test]
    fn test_namespace_prefixes_keys() {
        let storage = MemoryStorage::new();
        let admin = ExpiringCache::with_clock(storage.clone(), ManualClock::new(0))
            .with_namespace("admin");
        let shop = ExpiringCache::with_clock(storage.clone(), ManualClock::new(0))
            .with_namespace("shop");

        admin.save("cart", &1u32, 1000).unwrap();
        shop.save("cart", &2u32, 1000).unwrap();

        assert!(storage.contains_key("admin:cart"));
        assert!(storage.contains_key("shop:cart"));
        assert_eq!(admin.get::<u32>("cart").unwrap(), Some(1));
        assert_eq!(shop.get::<u32>("cart").unwrap(), Some(2));

        admin.clear("cart").unwrap();
        assert_eq!(shop.get::<u32>("cart").unwrap(), Some(2));
    }

    #[test]
    fn test_save_default_uses_configured_ttl() {
        let (cache, _, clock) = test_cache();
        let cache = cache.with_default_ttl(50);

        cache.save_default("k", "v").unwrap();
        assert_eq!(cache.ttl_remaining("k").unwrap(), Some(50));

        clock.set(51);
        assert!(cache.get::<String>("k").unwrap().is_none());
    }

    #[test]
    fn test_ttl_remaining() {
        let (cache, storage, clock) = test_cache();

        assert_eq!(cache.ttl_remaining("k").unwrap(), None);

        cache.save("k", &[1, 2, 3], 1000).unwrap();
        clock.set(400);
        assert_eq!(cache.ttl_remaining("k").unwrap(), Some(600));

        clock.set(1001);
        assert_eq!(cache.ttl_remaining("k").unwrap(), None);
        assert!(!storage.contains_key("k"));
        assert_eq!(cache.stats().reads(), 0);
    }

    #[test]
    fn test_stats_track_outcomes() {
        let (cache, storage, clock) = test_cache();

        cache.save("a", &1u8, 10).unwrap();
        cache.save("b", &2u8, 1000).unwrap();
        storage.set_item("c", "garbage").unwrap();

        cache.get::<u8>("b").unwrap();
        cache.get::<u8>("nope").unwrap();
        cache.get::<u8>("c").unwrap();
        clock.set(20);
        cache.get::<u8>("a").unwrap();
        cache.clear("b").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.corrupted, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.clears, 1);
    }

    #[test]
    fn test_unserializable_value() {
        let (cache, storage, _) = test_cache();

        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);

        let result = cache.save("k", &bad, 1000);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_quota_error_surfaces() {
        let cache = ExpiringCache::with_clock(MemoryStorage::with_quota(16), ManualClock::new(0));

        let result = cache.save("k", &"x".repeat(64), 1000);
        assert!(matches!(
            result,
            Err(CacheError::Storage(StorageError::QuotaExceeded { .. }))
        ));
        assert_eq!(cache.stats().writes, 0);
    }

    /// Store that holds one raw item and refuses to remove anything.
    struct StickyStorage(String);

    impl Storage for StickyStorage {
        fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(Some(self.0.clone()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }

        fn remove_item(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
    }

    #[test]
    fn test_failed_purge_still_reports_absent() {
        let raw = r#"{"value": 1, "expiresAt": 10}"#.to_string();
        let cache = ExpiringCache::with_clock(StickyStorage(raw), ManualClock::new(100));

        assert_eq!(cache.get::<u8>("k").unwrap(), None);
        assert!(matches!(cache.clear("k"), Err(CacheError::Storage(_))));
        assert!(matches!(cache.save("k", &1u8, 10), Err(CacheError::Storage(_))));
    }
}
