//! Request DTOs for the client HTTP facade
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use axum::body::Bytes;
use serde::Deserialize;

use crate::cache::{CacheStore, EvictionPolicy, DEFAULT_CAPACITY};

/// Request body for switching strategy (PUT /strategy)
///
/// # Fields
/// - `policy`: Eviction policy of the new store
/// - `capacity`: Optional capacity (default 1000)
/// - `ttl`: Optional TTL in seconds (no expiry if omitted)
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyRequest {
    pub policy: EvictionPolicy,
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl StrategyRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.capacity == Some(0) {
            return Some("Capacity must be at least 1".to_string());
        }
        if self.ttl == Some(0) {
            return Some("TTL must be at least 1 second".to_string());
        }
        None
    }

    /// Builds the empty store this request describes.
    pub fn build_store(&self) -> CacheStore<Bytes> {
        CacheStore::new(
            self.policy,
            self.capacity.unwrap_or(DEFAULT_CAPACITY),
            self.ttl.map(Duration::from_secs),
        )
    }
}
