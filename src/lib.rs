//! Image Cache - client-side cache for a replicated image backend
//!
//! Serves images from a bounded local cache with LRU, LFU, FIFO or Random
//! eviction, fails over across backend replicas on a miss, and refreshes
//! cached images when a replica reports them changed.

pub mod api;
pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backend::{BackendPool, PoolSettings};
pub use cache::{CacheStore, EvictionPolicy};
pub use client::{CacheClient, PerformanceReport};
pub use config::Config;
pub use error::{ClientError, ListenerError};
pub use tasks::ListenerSettings;
