//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with a pluggable eviction
//! policy and lazy TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use tracing::trace;

use crate::cache::policy::PolicyState;
use crate::cache::{CacheEntry, CacheStats, EvictionPolicy};

// == Cache Store ==
/// Bounded key-value store with one fixed eviction policy.
///
/// Expiry is checked lazily: an expired entry is removed by the next `get`
/// that observes it, never by a background sweep.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Policy bookkeeping
    state: PolicyState,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Maximum age of an entry, None = never expires
    ttl: Option<Duration>,
    /// Next write sequence number
    sequence: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new store. A capacity of 0 is clamped to 1.
    ///
    /// # Arguments
    /// * `policy` - Eviction policy, fixed for the lifetime of the store
    /// * `capacity` - Maximum number of entries the store can hold
    /// * `ttl` - Optional maximum entry age
    pub fn new(policy: EvictionPolicy, capacity: usize, ttl: Option<Duration>) -> Self {
        Self::build(policy, capacity, ttl, None)
    }

    /// Like [`new`](Self::new), with a fixed seed for the Random policy.
    pub fn with_seed(
        policy: EvictionPolicy,
        capacity: usize,
        ttl: Option<Duration>,
        seed: u64,
    ) -> Self {
        Self::build(policy, capacity, ttl, Some(seed))
    }

    fn build(
        policy: EvictionPolicy,
        capacity: usize,
        ttl: Option<Duration>,
        seed: Option<u64>,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(4096)),
            state: PolicyState::new(policy, seed),
            stats: CacheStats::new(policy, capacity),
            capacity,
            ttl,
            sequence: 0,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is unknown or expired; an expired entry is
    /// removed as a side effect. A hit updates recency/frequency per policy.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if self.remove_if_expired(key) {
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        self.state.record_access(key, entry);
        Some(entry.value.clone())
    }

    // == Put ==
    /// Inserts or updates a value.
    ///
    /// An existing key is updated in place without changing the size. A new
    /// key on a full store first evicts exactly one victim chosen by policy.
    /// An expired key is removed first and then inserted fresh.
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.remove_if_expired(&key);
        let sequence = self.next_sequence();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.touch();
            self.state.record_update(&key, entry, sequence);
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_one();
        }

        let entry = CacheEntry::new(value, sequence);
        self.state.record_insert(&key, &entry);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Contains ==
    /// Returns true if `key` is present and not expired. Does not mutate.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(self.ttl))
    }

    // == Remove ==
    /// Removes an entry by key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.state.record_removal(key, &entry);
        self.stats.set_total_entries(self.entries.len());
        Some(entry.value)
    }

    /// Drops `key` if it is present and expired. Returns true if it was dropped.
    fn remove_if_expired(&mut self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(self.ttl));
        if !expired {
            return false;
        }

        if let Some(entry) = self.entries.remove(key) {
            self.state.record_removal(key, &entry);
            self.stats.record_expiration();
            self.stats.set_total_entries(self.entries.len());
            trace!(key, age = ?entry.age(), "Removed expired entry");
        }
        true
    }

    fn evict_one(&mut self) {
        if let Some(victim) = self.state.select_victim(&self.entries) {
            self.entries.remove(&victim);
            self.stats.record_eviction();
            trace!(key = %victim, policy = %self.state.policy(), "Evicted entry");
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    /// Frequency counter of a live entry, for inspection.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.frequency)
    }

    /// Present keys in arbitrary order, expired ones included.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.state.policy()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
