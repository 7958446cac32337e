//! Cache Statistics Module
//!
//! Tracks read outcomes and writes for observability. Counters never change
//! what `get` returns.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a value
    pub hits: u64,
    /// Reads that found nothing at the key
    pub misses: u64,
    /// Reads that found an expired entry and purged it
    pub expired: u64,
    /// Reads that found a malformed entry and purged it
    pub corrupted: u64,
    /// Successful saves
    pub writes: u64,
    /// Successful clears
    pub clears: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Expired and corrupted reads count as misses. Returns 0.0 if no reads
    /// have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.reads();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of reads.
    pub fn reads(&self) -> u64 {
        self.hits + self.misses + self.expired + self.corrupted
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expired(&mut self) {
        self.expired += 1;
    }

    pub fn record_corrupted(&mut self) {
        self.corrupted += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_clear(&mut self) {
        self.clears += 1;
    }
}
