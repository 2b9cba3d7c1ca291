//! Eviction Policy Module
//!
//! Policy selection and the per-policy bookkeeping behind a store.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, FifoQueue, LfuIndex, LruTracker};
use crate::error::ClientError;

// == Eviction Policy ==
/// Rule choosing which entry leaves a full store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently used
    Lru,
    /// Least frequently used
    Lfu,
    /// First in, first out
    Fifo,
    /// Uniformly random victim
    Random,
}

impl EvictionPolicy {
    pub const ALL: [EvictionPolicy; 4] = [
        EvictionPolicy::Lru,
        EvictionPolicy::Lfu,
        EvictionPolicy::Fifo,
        EvictionPolicy::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Fifo => "fifo",
            EvictionPolicy::Random => "random",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "fifo" => Ok(EvictionPolicy::Fifo),
            "random" | "rr" => Ok(EvictionPolicy::Random),
            other => Err(ClientError::InvalidRequest(format!(
                "Unknown eviction policy '{}'",
                other
            ))),
        }
    }
}

// == Policy State ==
/// Auxiliary structure kept alongside the entry map.
///
/// Every mutation of the entry map goes through one of the `record_*`
/// methods so the bookkeeping never drifts from the map.
#[derive(Debug)]
pub(crate) enum PolicyState {
    Lru(LruTracker),
    Lfu(LfuIndex),
    Fifo(FifoQueue),
    Random(StdRng),
}

impl PolicyState {
    pub(crate) fn new(policy: EvictionPolicy, seed: Option<u64>) -> Self {
        match policy {
            EvictionPolicy::Lru => PolicyState::Lru(LruTracker::new()),
            EvictionPolicy::Lfu => PolicyState::Lfu(LfuIndex::new()),
            EvictionPolicy::Fifo => PolicyState::Fifo(FifoQueue::new()),
            EvictionPolicy::Random => PolicyState::Random(match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            }),
        }
    }

    pub(crate) fn policy(&self) -> EvictionPolicy {
        match self {
            PolicyState::Lru(_) => EvictionPolicy::Lru,
            PolicyState::Lfu(_) => EvictionPolicy::Lfu,
            PolicyState::Fifo(_) => EvictionPolicy::Fifo,
            PolicyState::Random(_) => EvictionPolicy::Random,
        }
    }

    /// A brand-new key entered the map.
    pub(crate) fn record_insert<V>(&mut self, key: &str, entry: &CacheEntry<V>) {
        match self {
            PolicyState::Lru(lru) => lru.touch(key),
            PolicyState::Lfu(index) => index.insert(key, entry.frequency, entry.sequence),
            PolicyState::Fifo(fifo) => fifo.push(key),
            PolicyState::Random(_) => {}
        }
    }

    /// A `get` hit on `key`.
    pub(crate) fn record_access<V>(&mut self, key: &str, entry: &mut CacheEntry<V>) {
        match self {
            PolicyState::Lru(lru) => {
                entry.touch();
                lru.touch(key);
            }
            PolicyState::Lfu(index) => {
                let old = (entry.frequency, entry.sequence);
                entry.frequency += 1;
                index.rerank(key, old, (entry.frequency, entry.sequence));
            }
            PolicyState::Fifo(_) | PolicyState::Random(_) => {}
        }
    }

    /// A `put` over an existing key. The caller replaces the value.
    pub(crate) fn record_update<V>(&mut self, key: &str, entry: &mut CacheEntry<V>, sequence: u64) {
        match self {
            PolicyState::Lru(lru) => lru.touch(key),
            PolicyState::Lfu(index) => {
                let old = (entry.frequency, entry.sequence);
                entry.frequency += 1;
                entry.sequence = sequence;
                index.rerank(key, old, (entry.frequency, entry.sequence));
            }
            PolicyState::Fifo(_) | PolicyState::Random(_) => {}
        }
    }

    /// `key` left the map for a reason other than eviction.
    pub(crate) fn record_removal<V>(&mut self, key: &str, entry: &CacheEntry<V>) {
        match self {
            PolicyState::Lru(lru) => lru.remove(key),
            PolicyState::Lfu(index) => index.remove(key, entry.frequency, entry.sequence),
            PolicyState::Fifo(fifo) => fifo.remove(key),
            PolicyState::Random(_) => {}
        }
    }

    /// Picks the next victim and drops it from the bookkeeping.
    ///
    /// The caller must remove the returned key from the map.
    pub(crate) fn select_victim<V>(
        &mut self,
        entries: &HashMap<String, CacheEntry<V>>,
    ) -> Option<String> {
        match self {
            PolicyState::Lru(lru) => {
                while let Some(key) = lru.evict_oldest() {
                    if entries.contains_key(&key) {
                        return Some(key);
                    }
                }
                None
            }
            PolicyState::Lfu(index) => {
                while let Some(key) = index.pop_least() {
                    if entries.contains_key(&key) {
                        return Some(key);
                    }
                }
                None
            }
            PolicyState::Fifo(fifo) => {
                while let Some(key) = fifo.pop_oldest() {
                    if entries.contains_key(&key) {
                        return Some(key);
                    }
                }
                None
            }
            PolicyState::Random(rng) => entries.keys().choose(rng).cloned(),
        }
    }
}
