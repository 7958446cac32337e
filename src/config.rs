//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Document the file store persists to
    pub storage_path: PathBuf,
    /// TTL in milliseconds used by `save_default`
    pub default_ttl_ms: u64,
    /// Prefix applied to every key, if any
    pub namespace: Option<String>,
    /// Byte quota of the backing store, if any
    pub quota_bytes: Option<usize>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_STORAGE_PATH` - Backing document (default: cache_store.json)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_NAMESPACE` - Key prefix (default: none)
    /// - `CACHE_QUOTA_BYTES` - Store quota in bytes (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults; empty strings count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            storage_path: var("CACHE_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            default_ttl_ms: var("CACHE_DEFAULT_TTL_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            namespace: var("CACHE_NAMESPACE"),
            quota_bytes: var("CACHE_QUOTA_BYTES").and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Rejects values the cache cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(CacheError::Config("storage path cannot be empty".to_string()));
        }
        if self.quota_bytes == Some(0) {
            return Err(CacheError::Config("quota must be greater than zero".to_string()));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("cache_store.json"),
            default_ttl_ms: 300_000,
            namespace: None,
            quota_bytes: None,
        }
    }
}
