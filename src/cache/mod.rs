//! Cache Module
//!
//! Provides a TTL-bounded cache over a pluggable key/value store with lazy
//! expiration.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::ExpiringCache;

// == Public Constants ==
/// Separator between a namespace and the caller's key
pub const NAMESPACE_SEPARATOR: char = ':';
