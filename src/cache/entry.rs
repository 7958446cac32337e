//! Cache Entry Module
//!
//! Defines the persisted shape of a cache entry: the payload plus an
//! absolute expiration timestamp.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

// == Cache Entry ==
/// A stored value together with its expiration time.
///
/// Persisted as `{"value": ..., "expiresAt": <ms>}`. There is no version
/// field; documents with any other shape fail to decode. Both fields are
/// required, even when `T` is an `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound(deserialize = "T: Deserialize<'de>"))]
pub struct CacheEntry<T> {
    /// The stored value
    #[serde(deserialize_with = "required")]
    pub value: T,
    /// Expiration timestamp (Unix milliseconds)
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry that expires `ttl_ms` after `now_ms`.
    ///
    /// The expiration saturates at `i64::MAX` for very large TTLs.
    pub fn new(value: T, ttl_ms: u64, now_ms: i64) -> Self {
        let ttl = i64::try_from(ttl_ms).unwrap_or(i64::MAX);
        Self {
            value,
            expires_at: now_ms.saturating_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: an entry is still valid when `now_ms` equals
    /// `expires_at` and expired strictly after it.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> u64 {
        u64::try_from(self.expires_at.saturating_sub(now_ms)).unwrap_or(0)
    }
}

impl<T: Serialize> CacheEntry<T> {
    /// Encodes the entry as its JSON text form.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned> CacheEntry<T> {
    /// Decodes a stored document, or `None` if it does not match the shape.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Deserializes a field as-is. Routing a field through `deserialize_with`
/// makes serde report it missing instead of defaulting an `Option` to `None`.
fn required<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer)
}
