//! Cache Statistics Module
//!
//! Tracks store-level bookkeeping: evictions, expirations and occupancy.
//! Hit/miss accounting lives with the client, which owns the request path.

use serde::Serialize;

use crate::cache::EvictionPolicy;

// == Cache Stats ==
/// Snapshot of a store's internal counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Active eviction policy
    pub policy: EvictionPolicy,
    /// Maximum number of entries
    pub capacity: usize,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Entries removed to make room for new keys
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates zeroed stats for a store.
    pub fn new(policy: EvictionPolicy, capacity: usize) -> Self {
        Self {
            policy,
            capacity,
            total_entries: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    // == Fill Ratio ==
    /// Fraction of capacity in use, between 0.0 and 1.0.
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.total_entries as f64 / self.capacity as f64
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
