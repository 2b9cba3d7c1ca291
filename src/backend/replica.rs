//! Backend Replica Module
//!
//! One image-serving backend and its failure counter.

use std::sync::atomic::{AtomicU32, Ordering};

// == Backend Replica ==
/// A single backend replica address with health bookkeeping.
#[derive(Debug)]
pub struct BackendReplica {
    /// Base URL, without trailing slash
    address: String,
    /// Failures since the last success
    consecutive_failures: AtomicU32,
}

impl BackendReplica {
    /// Creates a replica from a base URL.
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            address: address.trim().trim_end_matches('/').to_string(),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `GET /images/{id}` endpoint for this replica.
    pub fn image_url(&self, id: &str) -> String {
        format!("{}/images/{}", self.address, id)
    }

    /// Server-sent event feed for this replica.
    pub fn events_url(&self) -> String {
        format!("{}/events", self.address)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Returns the updated failure count.
    pub fn record_failure(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }
}
