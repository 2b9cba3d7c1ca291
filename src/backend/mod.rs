//! Backend Module
//!
//! Replica bookkeeping and fetch-with-failover against the image backends.

mod pool;
mod replica;

pub use pool::{BackendPool, BackendSource, PoolSettings, DEFAULT_MAX_ROUNDS};
pub use replica::BackendReplica;
