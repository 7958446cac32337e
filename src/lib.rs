//! Local TTL Cache - expiring values over a persistent key/value store
//!
//! Wraps a synchronous string-keyed store (in-memory or file-backed) and
//! stores each value with an absolute expiration time. Stale and malformed
//! entries are purged lazily on read.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod storage;
pub mod telemetry;

pub use cache::{CacheEntry, CacheStats, ExpiringCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result, StorageError};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use telemetry::init_tracing;
