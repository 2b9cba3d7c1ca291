//! FIFO Queue Module
//!
//! Insertion-order tracking for FIFO eviction.

use std::collections::{HashMap, VecDeque};

// == FIFO Queue ==
/// Insertion-order queue with lazy removal.
///
/// Removing a key only forgets its live stamp; the stale queue slot is
/// skipped the next time eviction walks past it. A key that is removed and
/// re-inserted gets a new stamp, so its old slot can never evict it early.
#[derive(Debug, Default)]
pub struct FifoQueue {
    /// (stamp, key) in insertion order
    queue: VecDeque<(u64, String)>,
    /// Key -> stamp of its live queue slot
    live: HashMap<String, u64>,
    next_stamp: u64,
}

impl FifoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Appends a newly inserted key. Keys already queued keep their position.
    pub fn push(&mut self, key: &str) {
        if self.live.contains_key(key) {
            return;
        }
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.live.insert(key.to_string(), stamp);
        self.queue.push_back((stamp, key.to_string()));
    }

    // == Remove ==
    /// Forgets a key; its slot is skipped lazily.
    pub fn remove(&mut self, key: &str) {
        self.live.remove(key);
    }

    // == Pop Oldest ==
    /// Dequeues until a still-live key is found.
    pub fn pop_oldest(&mut self) -> Option<String> {
        while let Some((stamp, key)) = self.queue.pop_front() {
            if self.live.get(&key) == Some(&stamp) {
                self.live.remove(&key);
                return Some(key);
            }
        }
        None
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
