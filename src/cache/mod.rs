//! Cache Module
//!
//! Bounded in-memory store with LRU, LFU, FIFO or Random eviction and lazy
//! TTL expiration.

mod entry;
mod fifo;
mod lfu;
mod lru;
mod policy;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use fifo::FifoQueue;
pub use lfu::LfuIndex;
pub use lru::LruTracker;
pub use policy::EvictionPolicy;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default number of entries, matching the backend harness setup
pub const DEFAULT_CAPACITY: usize = 1000;

/// Maximum allowed image id length in bytes
pub const MAX_ID_LENGTH: usize = 256;
