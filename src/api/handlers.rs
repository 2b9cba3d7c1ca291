//! API Handlers
//!
//! HTTP request handlers exposing the cache client to a workload harness.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::client::{CacheClient, PerformanceReport};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{HealthResponse, StrategyRequest, StrategyResponse};

/// Response header carrying the request latency in microseconds
pub const LATENCY_HEADER: HeaderName = HeaderName::from_static("x-cache-latency-us");

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<CacheClient>,
}

impl AppState {
    pub fn new(client: CacheClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheClient::from_config(config)?))
    }
}

/// Handler for GET /images/:id
///
/// Serves the image bytes, from the cache when possible.
pub async fn image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let (bytes, latency) = state.client.request_image(&id).await?;

    let latency_us = HeaderValue::from(latency.as_micros() as u64);
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (LATENCY_HEADER, latency_us),
        ],
        bytes,
    )
        .into_response())
}

/// Handler for GET /stats
///
/// Returns the performance report of the client.
pub async fn stats_handler(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(state.client.evaluate_performance().await)
}

/// Handler for PUT /strategy
///
/// Replaces the cache with an empty store using the requested policy.
pub async fn strategy_handler(
    State(state): State<AppState>,
    Json(req): Json<StrategyRequest>,
) -> Result<Json<StrategyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ClientError::InvalidRequest(error_msg));
    }

    let store = req.build_store();
    let response = StrategyResponse::new(store.policy(), store.capacity(), req.ttl);
    state.client.set_strategy(store).await;

    Ok(Json(response))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.client.listener_count().await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendPool;
    use crate::cache::{CacheStore, EvictionPolicy};

    fn local_state(dir: &std::path::Path) -> AppState {
        let store = CacheStore::new(EvictionPolicy::Lru, 10, None);
        AppState::new(CacheClient::new(store, BackendPool::local(dir)))
    }

    #[tokio::test]
    async fn test_image_handler_sets_latency_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test_7.jpeg"), b"seven").unwrap();
        let state = local_state(dir.path());

        let response = image_handler(State(state), Path("7".to_string()))
            .await
            .unwrap();
        assert!(response.headers().contains_key(LATENCY_HEADER));
    }

    #[tokio::test]
    async fn test_image_handler_missing_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let state = local_state(dir.path());

        let result = image_handler(State(state), Path("7".to_string())).await;
        assert!(matches!(result, Err(ClientError::Io(_))));
    }

    #[tokio::test]
    async fn test_stats_handler_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let response = stats_handler(State(local_state(dir.path()))).await;
        assert!(matches!(response.0, PerformanceReport::NoData));
    }

    #[tokio::test]
    async fn test_strategy_handler_switches_policy() {
        let dir = tempfile::tempdir().unwrap();
        let state = local_state(dir.path());
        let req = StrategyRequest {
            policy: EvictionPolicy::Fifo,
            capacity: Some(3),
            ttl: None,
        };

        let response = strategy_handler(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(response.policy, EvictionPolicy::Fifo);
        assert_eq!(
            state.client.store().read().await.policy(),
            EvictionPolicy::Fifo
        );
    }

    #[tokio::test]
    async fn test_strategy_handler_rejects_zero_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let req = StrategyRequest {
            policy: EvictionPolicy::Lru,
            capacity: Some(0),
            ttl: None,
        };

        let result = strategy_handler(State(local_state(dir.path())), Json(req)).await;
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let dir = tempfile::tempdir().unwrap();
        let response = health_handler(State(local_state(dir.path()))).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.listeners, 0);
    }
}
