//! Response DTOs for the client HTTP facade
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::EvictionPolicy;

/// Response body for a strategy switch (PUT /strategy)
#[derive(Debug, Clone, Serialize)]
pub struct StrategyResponse {
    /// Success message
    pub message: String,
    pub policy: EvictionPolicy,
    pub capacity: usize,
    /// TTL in seconds, None = no expiry
    pub ttl: Option<u64>,
}

impl StrategyResponse {
    pub fn new(policy: EvictionPolicy, capacity: usize, ttl: Option<u64>) -> Self {
        Self {
            message: format!("Switched to {} cache, previous entries dropped", policy),
            policy,
            capacity,
            ttl,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Running invalidation listeners
    pub listeners: usize,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(listeners: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            listeners,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
