//! LFU Index Module
//!
//! Frequency index for LFU eviction.

use std::collections::BTreeSet;

// == LFU Index ==
/// Orders keys by `(frequency, sequence)`.
///
/// The first element is the eviction victim: lowest frequency, and among
/// equal frequencies the entry with the oldest insert/update sequence.
#[derive(Debug, Default)]
pub struct LfuIndex {
    ranks: BTreeSet<(u64, u64, String)>,
}

impl LfuIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, frequency: u64, sequence: u64) {
        self.ranks.insert((frequency, sequence, key.to_string()));
    }

    pub fn remove(&mut self, key: &str, frequency: u64, sequence: u64) {
        self.ranks.remove(&(frequency, sequence, key.to_string()));
    }

    /// Moves a key from its old rank to a new one.
    pub fn rerank(&mut self, key: &str, old: (u64, u64), new: (u64, u64)) {
        self.remove(key, old.0, old.1);
        self.insert(key, new.0, new.1);
    }

    /// Removes and returns the least frequently used key.
    pub fn pop_least(&mut self) -> Option<String> {
        self.ranks.pop_first().map(|(_, _, key)| key)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
