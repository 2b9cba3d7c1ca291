//! Invalidation Listener Task
//!
//! Background task that follows one replica's event stream and refreshes
//! cached images the backend reports as changed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend::BackendPool;
use crate::client::SharedStore;
use crate::error::ListenerError;
use crate::tasks::events::EventLineBuffer;

// == Listener Settings ==
/// Stream and reconnect behavior for a listener.
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    /// Longest single read before the stop flag is checked again
    pub read_timeout: Duration,
    /// Reconnect after the stream closes or fails
    pub reconnect: bool,
    /// Reconnects allowed in a row without a successful subscribe
    pub max_reconnect_attempts: u32,
    /// First reconnect delay, doubled on each further attempt
    pub reconnect_delay: Duration,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(1),
            reconnect: true,
            max_reconnect_attempts: 10,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

// == Invalidation Listener ==
/// Subscription to a single replica's change feed.
pub struct InvalidationListener {
    address: String,
    events_url: String,
    pool: Arc<BackendPool>,
    store: SharedStore,
    stop: Arc<AtomicBool>,
    settings: ListenerSettings,
}

impl InvalidationListener {
    /// Creates a listener for the replica at `replica_index` in `pool`.
    ///
    /// Returns `None` if the pool has no such replica.
    pub fn new(
        pool: Arc<BackendPool>,
        replica_index: usize,
        store: SharedStore,
        settings: ListenerSettings,
    ) -> Option<Self> {
        let replica = pool.replicas().get(replica_index)?;
        let address = replica.address().to_string();
        let events_url = replica.events_url();

        Some(Self {
            address,
            events_url,
            pool,
            store,
            stop: Arc::new(AtomicBool::new(false)),
            settings,
        })
    }

    /// Flag that stops the listener at its next read iteration.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    // == Run ==
    /// Follows the event stream until stopped or a non-recoverable error.
    pub async fn run(self) -> Result<(), ListenerError> {
        let mut reconnect_attempts = 0u32;

        loop {
            if self.is_stopped() {
                break;
            }

            let err = match self.connect_and_stream(&mut reconnect_attempts).await {
                Ok(()) => break,
                Err(err) => err,
            };
            error!(replica = %self.address, error = %err, "Invalidation stream failed");

            if !self.settings.reconnect {
                return Err(err);
            }

            reconnect_attempts += 1;
            if reconnect_attempts > self.settings.max_reconnect_attempts {
                return Err(ListenerError::MaxReconnectAttempts(self.address.clone()));
            }

            let delay = self
                .settings
                .reconnect_delay
                .saturating_mul(2u32.saturating_pow((reconnect_attempts - 1).min(16)));
            warn!(
                replica = %self.address,
                "Reconnecting in {:?} (attempt {}/{})",
                delay,
                reconnect_attempts,
                self.settings.max_reconnect_attempts
            );
            tokio::time::sleep(delay).await;
        }

        info!(replica = %self.address, "Invalidation listener stopped");
        Ok(())
    }

    async fn connect_and_stream(&self, reconnect_attempts: &mut u32) -> Result<(), ListenerError> {
        let response = self
            .pool
            .http_client()
            .get(&self.events_url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|source| ListenerError::Connect {
                address: self.address.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ListenerError::Status {
                address: self.address.clone(),
                status: status.as_u16(),
            });
        }

        info!(replica = %self.address, "Subscribed to invalidation events");
        *reconnect_attempts = 0;

        let mut stream = response.bytes_stream();
        let mut lines = EventLineBuffer::new();

        loop {
            if self.is_stopped() {
                return Ok(());
            }

            match tokio::time::timeout(self.settings.read_timeout, stream.next()).await {
                // Nothing arrived yet, connection still open
                Err(_) => tokio::task::yield_now().await,
                Ok(None) => {
                    if lines.pending_len() > 0 {
                        warn!(
                            replica = %self.address,
                            bytes = lines.pending_len(),
                            "Event stream closed mid-line, partial event dropped"
                        );
                    }
                    return Err(ListenerError::Closed(self.address.clone()));
                }
                Ok(Some(Err(source))) => {
                    return Err(ListenerError::Stream {
                        address: self.address.clone(),
                        source,
                    })
                }
                Ok(Some(Ok(chunk))) => {
                    for id in lines.push(&chunk) {
                        self.handle_invalidation(&id).await;
                    }
                }
            }
        }
    }

    /// Refreshes `id` if it is cached. Returns true when the entry was replaced.
    pub async fn handle_invalidation(&self, id: &str) -> bool {
        let cached = self.store.read().await.contains(id);
        if !cached {
            debug!(replica = %self.address, id, "Ignoring change for uncached image");
            return false;
        }

        let (bytes, elapsed) = match self.pool.fetch(id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(replica = %self.address, id, error = %e, "Failed to refresh changed image");
                return false;
            }
        };

        let mut store = self.store.write().await;
        // Evicted while we were fetching; do not resurrect it
        if !store.contains(id) {
            debug!(id, "Changed image left the cache during refresh");
            return false;
        }
        store.put(id, bytes);
        info!(replica = %self.address, id, ?elapsed, "Refreshed changed image");
        true
    }
}

// == Listener Handle ==
/// Owner of a running listener task.
///
/// Dropping the handle stops and aborts the task.
#[derive(Debug)]
pub struct ListenerHandle {
    address: String,
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<Result<(), ListenerError>>>,
}

impl ListenerHandle {
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Requests a cooperative stop; in-flight reads finish or time out.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stops the listener and waits for its result.
    pub async fn shutdown(mut self) -> Result<(), ListenerError> {
        self.stop();
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match task.await {
            Ok(result) => result,
            Err(e) => Err(ListenerError::Task {
                address: self.address.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawns a listener on the tokio runtime.
///
/// The task logs its own terminal error; the same error is returned through
/// the handle so siblings are never affected.
pub fn spawn_listener(listener: InvalidationListener) -> ListenerHandle {
    let address = listener.address.clone();
    let stop = listener.stop_flag();

    let task_address = address.clone();
    let task = tokio::spawn(async move {
        let result = listener.run().await;
        if let Err(e) = &result {
            error!(replica = %task_address, error = %e, "Invalidation listener terminated");
        }
        result
    });

    ListenerHandle {
        address,
        stop,
        task: Some(task),
    }
}
