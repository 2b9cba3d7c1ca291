//! Backend Pool Module
//!
//! Round-robin replica selection with failover, exponential backoff and an
//! offline mode that reads fixtures from a local directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use tracing::{debug, error, warn};

use crate::backend::BackendReplica;
use crate::error::{ClientError, Result};

/// Full passes over all replicas before a fetch gives up
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

// == Pool Settings ==
/// Retry and timeout knobs for a pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Full passes over the replica list before aborting
    pub max_rounds: u32,
    /// Backoff time unit; the sleep after round `r` is `unit * 2^r`
    pub backoff_unit: Duration,
    /// Per-request timeout for image fetches
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            backoff_unit: Duration::from_millis(100),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

// == Backend Source ==
/// Where image bytes come from.
#[derive(Debug)]
pub enum BackendSource {
    /// HTTP replicas, tried in rotation
    Replicas(Vec<BackendReplica>),
    /// Offline mode: `<dir>/test_<id>.jpeg`
    LocalDir(PathBuf),
}

/// Outcome of a single attempt against one replica.
enum AttemptError {
    /// Worth trying the next replica
    Transient(String),
    /// Retrying cannot help
    Fatal(ClientError),
}

// == Backend Pool ==
/// Set of backend replicas with a shared rotation cursor.
#[derive(Debug)]
pub struct BackendPool {
    source: BackendSource,
    cursor: AtomicUsize,
    settings: PoolSettings,
    http: reqwest::Client,
}

impl BackendPool {
    // == Constructors ==
    /// Creates a pool over HTTP replicas.
    pub fn http<I, S>(addresses: I, settings: PoolSettings) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replicas = addresses.into_iter().map(BackendReplica::new).collect();
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            source: BackendSource::Replicas(replicas),
            cursor: AtomicUsize::new(0),
            settings,
            http,
        })
    }

    /// Creates an offline pool reading fixtures from `dir`.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: BackendSource::LocalDir(dir.into()),
            cursor: AtomicUsize::new(0),
            settings: PoolSettings::default(),
            http: reqwest::Client::new(),
        }
    }

    // == Fetch ==
    /// Fetches an image, failing over across replicas.
    ///
    /// Returns the bytes and the elapsed time including retries and backoff.
    ///
    /// # Errors
    /// - `Unavailable` after `max_rounds` full passes of transient failures
    /// - `Protocol` immediately on a malformed response
    /// - `Io` immediately in offline mode
    pub async fn fetch(&self, id: &str) -> Result<(Bytes, Duration)> {
        let started = Instant::now();
        let bytes = match &self.source {
            BackendSource::LocalDir(dir) => Self::fetch_local(dir, id).await?,
            BackendSource::Replicas(replicas) => self.fetch_with_failover(replicas, id).await?,
        };
        Ok((bytes, started.elapsed()))
    }

    async fn fetch_with_failover(&self, replicas: &[BackendReplica], id: &str) -> Result<Bytes> {
        let count = replicas.len();
        if count == 0 {
            return Err(ClientError::Unavailable {
                id: id.to_string(),
                attempts: 0,
            });
        }

        let per_round = count as u32;
        let max_attempts = self.settings.max_rounds.max(1) * per_round;
        let mut attempts = 0u32;

        loop {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % count;
            let replica = &replicas[index];

            match self.try_replica(replica, id).await {
                Ok(bytes) => {
                    replica.record_success();
                    debug!(id, replica = replica.address(), attempts, "Fetched image");
                    return Ok(bytes);
                }
                Err(AttemptError::Fatal(err)) => {
                    error!(id, replica = replica.address(), error = %err, "Fatal backend error");
                    return Err(err);
                }
                Err(AttemptError::Transient(reason)) => {
                    let failures = replica.record_failure();
                    attempts += 1;
                    warn!(
                        id,
                        replica = replica.address(),
                        failures,
                        attempt = attempts,
                        max_attempts,
                        "Backend fetch failed: {}",
                        reason
                    );

                    if attempts >= max_attempts {
                        error!(id, attempts, "All replicas unavailable");
                        return Err(ClientError::Unavailable {
                            id: id.to_string(),
                            attempts,
                        });
                    }

                    if attempts % per_round == 0 {
                        let delay = self.backoff_delay(attempts / per_round);
                        debug!(id, ?delay, "Completed a full round, backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    async fn try_replica(
        &self,
        replica: &BackendReplica,
        id: &str,
    ) -> std::result::Result<Bytes, AttemptError> {
        let url = replica.image_url(id);
        let response = match self
            .http
            .get(&url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Err(AttemptError::Fatal(ClientError::Protocol(format!(
                    "Invalid request for {}: {}",
                    url, e
                ))))
            }
            Err(e) => return Err(AttemptError::Transient(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Transient(format!("status {}", status)));
        }

        check_content_type(response.headers()).map_err(AttemptError::Fatal)?;

        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;
        if body.is_empty() {
            return Err(AttemptError::Fatal(ClientError::Protocol(format!(
                "Empty body from {}",
                url
            ))));
        }

        Ok(body)
    }

    async fn fetch_local(dir: &Path, id: &str) -> Result<Bytes> {
        let path = dir.join(format!("test_{}.jpeg", id));
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) => {
                error!(id, path = %path.display(), error = %e, "Failed to read local image");
                Err(ClientError::Io(e))
            }
        }
    }

    /// Sleep applied after `completed_rounds` full passes.
    pub fn backoff_delay(&self, completed_rounds: u32) -> Duration {
        self.settings
            .backoff_unit
            .saturating_mul(2u32.saturating_pow(completed_rounds.min(16)))
    }

    // == Accessors ==
    pub fn replicas(&self) -> &[BackendReplica] {
        match &self.source {
            BackendSource::Replicas(replicas) => replicas,
            BackendSource::LocalDir(_) => &[],
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.source, BackendSource::LocalDir(_))
    }

    /// Current rotation cursor, already reduced modulo the replica count.
    pub fn cursor(&self) -> usize {
        match self.replicas().len() {
            0 => 0,
            n => self.cursor.load(Ordering::Relaxed) % n,
        }
    }

    /// Shared HTTP session, also used by the invalidation listeners.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }
}

/// Accepts `image/*`, `application/octet-stream`, or no content type.
fn check_content_type(headers: &HeaderMap) -> Result<()> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(());
    };
    let content_type = value
        .to_str()
        .map_err(|_| ClientError::Protocol("Unreadable content type".to_string()))?
        .to_ascii_lowercase();

    if content_type.starts_with("image/") || content_type.starts_with("application/octet-stream")
    {
        Ok(())
    } else {
        Err(ClientError::Protocol(format!(
            "Unexpected content type '{}'",
            content_type
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_backoff_doubles_per_round() {
        let settings = PoolSettings {
            backoff_unit: Duration::from_millis(10),
            ..Default::default()
        };
        let pool = BackendPool::http(["http://a"], settings).unwrap();

        assert_eq!(pool.backoff_delay(1), Duration::from_millis(20));
        assert_eq!(pool.backoff_delay(2), Duration::from_millis(40));
        assert_eq!(pool.backoff_delay(3), Duration::from_millis(80));
    }

    #[test]
    fn test_content_type_check() {
        let mut headers = HeaderMap::new();
        assert!(check_content_type(&headers).is_ok());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
        assert!(check_content_type(&headers).is_ok());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        assert!(check_content_type(&headers).is_ok());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        assert!(matches!(
            check_content_type(&headers),
            Err(ClientError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_pool_is_unavailable() {
        let pool = BackendPool::http(Vec::<String>::new(), PoolSettings::default()).unwrap();

        let err = pool.fetch("1").await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable { attempts: 0, .. }));
    }

    #[tokio::test]
    async fn test_local_mode_reads_fixture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test_5.jpeg"), b"jpeg-bytes").unwrap();
        let pool = BackendPool::local(dir.path());

        let (bytes, _) = pool.fetch("5").await.unwrap();
        assert_eq!(&bytes[..], b"jpeg-bytes");
        assert!(pool.is_local());
        assert!(pool.replicas().is_empty());
    }

    #[tokio::test]
    async fn test_local_mode_missing_fixture_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pool = BackendPool::local(dir.path());

        let err = pool.fetch("404").await.unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[tokio::test]
    async fn test_invalid_address_is_not_retried() {
        let settings = PoolSettings {
            backoff_unit: Duration::from_secs(60),
            ..Default::default()
        };
        let pool = BackendPool::http(["not a url"], settings).unwrap();

        // A retry would sleep for a minute; a protocol error returns at once
        let err = pool.fetch("1").await.unwrap_err();
        assert!(err.is_protocol(), "{err:?}");
        assert_eq!(pool.replicas()[0].consecutive_failures(), 0);
    }
}
