//! Client Module
//!
//! The request path: hit/miss bookkeeping over a shared store and a backend pool.

mod cache_client;
mod stats;

use std::sync::Arc;

use axum::body::Bytes;
use tokio::sync::RwLock;

use crate::cache::CacheStore;

pub use cache_client::CacheClient;
pub use stats::{ClientStats, LatencyTotals, PerformanceReport, PerformanceSummary};

/// Store shared between the request path and the invalidation listeners
pub type SharedStore = Arc<RwLock<CacheStore<Bytes>>>;
