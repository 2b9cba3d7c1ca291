//! Configuration Module
//!
//! Handles loading and managing client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::Bytes;

use crate::backend::{PoolSettings, DEFAULT_MAX_ROUNDS};
use crate::cache::{CacheStore, EvictionPolicy, DEFAULT_CAPACITY};
use crate::tasks::ListenerSettings;

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Eviction policy of the initial store
    pub policy: EvictionPolicy,
    /// Maximum number of cached images
    pub capacity: usize,
    /// Entry time-to-live, None = never expires
    pub ttl: Option<Duration>,
    /// Base URLs of the backend replicas
    pub backend_urls: Vec<String>,
    /// Read fixtures from this directory instead of the backends
    pub local_image_dir: Option<PathBuf>,
    /// Full passes over the replicas before a fetch gives up
    pub max_rounds: u32,
    /// Backoff time unit in milliseconds
    pub backoff_ms: u64,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Reconnect listeners after their stream drops
    pub listener_reconnect: bool,
    /// Listener read timeout in milliseconds
    pub listener_read_timeout_ms: u64,
    /// HTTP facade port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_POLICY` - lru, lfu, fifo or random (default: lru)
    /// - `CACHE_CAPACITY` - Maximum cached images (default: 1000)
    /// - `CACHE_TTL_SECS` - Entry TTL in seconds (default: unset, no expiry)
    /// - `BACKEND_URLS` - Comma separated replica URLs (default: http://127.0.0.1:8000)
    /// - `LOCAL_IMAGE_DIR` - Offline fixture directory (default: unset)
    /// - `MAX_ROUNDS` - Failover rounds before giving up (default: 3)
    /// - `BACKOFF_MS` - Backoff time unit (default: 100)
    /// - `REQUEST_TIMEOUT_MS` - Image request timeout (default: 5000)
    /// - `LISTENER_RECONNECT` - Reconnect dropped event streams (default: true)
    /// - `LISTENER_READ_TIMEOUT_MS` - Event read timeout (default: 1000)
    /// - `SERVER_PORT` - HTTP facade port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            policy: parse_var("CACHE_POLICY").unwrap_or(defaults.policy),
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            ttl: parse_var::<u64>("CACHE_TTL_SECS").map(Duration::from_secs),
            backend_urls: env::var("BACKEND_URLS")
                .ok()
                .map(|v| split_urls(&v))
                .filter(|urls| !urls.is_empty())
                .unwrap_or(defaults.backend_urls),
            local_image_dir: env::var("LOCAL_IMAGE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            max_rounds: parse_var("MAX_ROUNDS").unwrap_or(defaults.max_rounds),
            backoff_ms: parse_var("BACKOFF_MS").unwrap_or(defaults.backoff_ms),
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
            listener_reconnect: parse_var("LISTENER_RECONNECT")
                .unwrap_or(defaults.listener_reconnect),
            listener_read_timeout_ms: parse_var("LISTENER_READ_TIMEOUT_MS")
                .unwrap_or(defaults.listener_read_timeout_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Builds an empty store with the configured policy, capacity and TTL.
    pub fn build_store(&self) -> CacheStore<Bytes> {
        CacheStore::new(self.policy, self.capacity, self.ttl)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_rounds: self.max_rounds,
            backoff_unit: Duration::from_millis(self.backoff_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..PoolSettings::default()
        }
    }

    pub fn listener_settings(&self) -> ListenerSettings {
        ListenerSettings {
            read_timeout: Duration::from_millis(self.listener_read_timeout_ms),
            reconnect: self.listener_reconnect,
            ..ListenerSettings::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: EvictionPolicy::Lru,
            capacity: DEFAULT_CAPACITY,
            ttl: None,
            backend_urls: vec!["http://127.0.0.1:8000".to_string()],
            local_image_dir: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            backoff_ms: 100,
            request_timeout_ms: 5000,
            listener_reconnect: true,
            listener_read_timeout_ms: 1000,
            server_port: 3000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn split_urls(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}
