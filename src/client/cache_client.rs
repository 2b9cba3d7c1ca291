//! Cache Client
//!
//! Single entry point for image requests: local store first, backend pool on
//! a miss, invalidation listeners keeping cached entries fresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::backend::BackendPool;
use crate::cache::{CacheStore, MAX_ID_LENGTH};
use crate::client::{ClientStats, PerformanceReport, SharedStore};
use crate::config::Config;
use crate::error::{ClientError, ListenerError, Result};
use crate::tasks::{spawn_listener, InvalidationListener, ListenerHandle, ListenerSettings};

// == Cache Client ==
/// Image client composing a store, a backend pool and invalidation listeners.
///
/// The store sits behind one lock shared with the listeners. The lock is
/// never held across network I/O.
pub struct CacheClient {
    store: SharedStore,
    pool: Arc<BackendPool>,
    stats: Arc<Mutex<ClientStats>>,
    listeners: Mutex<Vec<ListenerHandle>>,
}

impl CacheClient {
    // == Constructors ==
    /// Creates a client over an existing store and pool.
    pub fn new(store: CacheStore<Bytes>, pool: BackendPool) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            pool: Arc::new(pool),
            stats: Arc::new(Mutex::new(ClientStats::new())),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Creates a client from configuration. Listeners are not started.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pool = match &config.local_image_dir {
            Some(dir) => BackendPool::local(dir),
            None => BackendPool::http(&config.backend_urls, config.pool_settings())?,
        };
        Ok(Self::new(config.build_store(), pool))
    }

    // == Request Image ==
    /// Returns the image bytes and the latency of serving them.
    ///
    /// A hit reports the local lookup time; a miss reports the remote round
    /// trip including the store insert.
    ///
    /// # Errors
    /// - `InvalidRequest` for an empty or malformed id
    /// - `Unavailable` when every replica failed
    /// - `Protocol` / `Io` from the backend, not retried
    pub async fn request_image(&self, id: &str) -> Result<(Bytes, Duration)> {
        validate_id(id)?;
        let started = Instant::now();

        // Counted under the store guard, in the same lock order as set_strategy
        let epoch = {
            let mut store = self.store.write().await;
            if let Some(bytes) = store.get(id) {
                let latency = started.elapsed();
                self.stats.lock().await.record_hit(latency);
                debug!(id, ?latency, "Cache hit");
                return Ok((bytes, latency));
            }
            self.stats.lock().await.record_miss()
        };
        debug!(id, "Cache miss");

        let (bytes, fetch_time) = self.pool.fetch(id).await?;
        self.store.write().await.put(id, bytes.clone());

        let latency = started.elapsed();
        if !self.stats.lock().await.record_remote_latency(epoch, latency) {
            debug!(id, "Counters reset during fetch, remote sample dropped");
        }
        debug!(id, ?latency, ?fetch_time, size = bytes.len(), "Fetched from backend");
        Ok((bytes, latency))
    }

    // == Set Strategy ==
    /// Replaces the active store and resets hit/miss counters.
    ///
    /// Existing entries are discarded, not migrated: this is a cold start.
    pub async fn set_strategy(&self, store: CacheStore<Bytes>) {
        let mut current = self.store.write().await;
        let new_policy = store.policy();
        let previous = std::mem::replace(&mut *current, store);
        self.stats.lock().await.reset();

        info!(
            from = %previous.policy(),
            to = %new_policy,
            dropped = previous.len(),
            capacity = current.capacity(),
            "Cache strategy switched"
        );
    }

    // == Evaluate Performance ==
    /// Reports hit rate, totals and average latencies. Leaves cache state untouched.
    pub async fn evaluate_performance(&self) -> PerformanceReport {
        let stats = self.stats.lock().await.clone();
        let store_stats = self.store.read().await.stats();
        let report = stats.report(store_stats);

        match report.summary() {
            None => info!("No requests made yet"),
            Some(summary) => info!(
                hit_rate = %format!("{:.2}%", summary.hit_rate),
                miss_rate = %format!("{:.2}%", summary.miss_rate),
                total = summary.total_requests,
                hits = summary.hits,
                misses = summary.misses,
                "Cache performance"
            ),
        }
        report
    }

    // == Listeners ==
    /// Starts one invalidation listener per replica. Returns how many started.
    ///
    /// Offline pools have no event feed, so nothing is started for them.
    pub async fn spawn_listeners(&self, settings: ListenerSettings) -> usize {
        if self.pool.is_local() {
            warn!("Local image directory in use, invalidation listeners disabled");
            return 0;
        }

        let mut listeners = self.listeners.lock().await;
        let mut started = 0;
        for index in 0..self.pool.replicas().len() {
            let listener = InvalidationListener::new(
                self.pool.clone(),
                index,
                self.store.clone(),
                settings.clone(),
            );
            if let Some(listener) = listener {
                listeners.push(spawn_listener(listener));
                started += 1;
            }
        }
        info!(count = started, "Invalidation listeners started");
        started
    }

    /// Stops every listener and waits for them. Returns each listener's outcome.
    pub async fn shutdown(&self) -> Vec<(String, std::result::Result<(), ListenerError>)> {
        let handles: Vec<ListenerHandle> = self.listeners.lock().await.drain(..).collect();
        for handle in &handles {
            handle.stop();
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let address = handle.address().to_string();
            let result = handle.shutdown().await;
            outcomes.push((address, result));
        }
        info!(count = outcomes.len(), "Invalidation listeners stopped");
        outcomes
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.lock().await.len()
    }

    // == Accessors ==
    /// Shared handle to the active store.
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    /// Snapshot of the request counters.
    pub async fn stats(&self) -> ClientStats {
        self.stats.lock().await.clone()
    }
}

/// Rejects ids that cannot be used as a single URL path segment.
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ClientError::InvalidRequest(
            "Image id cannot be empty".to_string(),
        ));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(ClientError::InvalidRequest(format!(
            "Image id exceeds maximum length of {} bytes",
            MAX_ID_LENGTH
        )));
    }
    // "." and ".." would be normalized away as path segments
    if id.chars().all(|c| c == '.') {
        return Err(ClientError::InvalidRequest(format!(
            "Image id '{}' is not a valid path segment",
            id
        )));
    }
    if id
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(ClientError::InvalidRequest(format!(
            "Image id '{}' contains reserved characters",
            id
        )));
    }
    Ok(())
}
