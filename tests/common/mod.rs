//! Shared helpers for integration tests: mock image backends on ephemeral ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use image_cache::PoolSettings;
use tokio::sync::mpsc;

/// How a mock backend answers image requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// 200 with `image-<id>-v<version>`
    Healthy,
    /// 503 for everything
    Failing,
    /// 200 with an HTML page
    Html,
}

#[derive(Clone)]
struct BackendState {
    behavior: Behavior,
    image_requests: Arc<AtomicUsize>,
    per_id: Arc<Mutex<HashMap<String, usize>>>,
    versions: Arc<Mutex<HashMap<String, u32>>>,
    events_rx: Arc<tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<String>>>>,
}

/// A running mock backend.
pub struct MockBackend {
    pub address: String,
    state: BackendState,
    events_tx: mpsc::UnboundedSender<String>,
}

impl MockBackend {
    pub async fn spawn(behavior: Behavior) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = BackendState {
            behavior,
            image_requests: Arc::new(AtomicUsize::new(0)),
            per_id: Arc::new(Mutex::new(HashMap::new())),
            versions: Arc::new(Mutex::new(HashMap::new())),
            events_rx: Arc::new(tokio::sync::Mutex::new(Some(events_rx))),
        };

        let app = Router::new()
            .route("/images/:id", get(image))
            .route("/events", get(events))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            address,
            state,
            events_tx,
        }
    }

    /// Total image requests received.
    pub fn image_requests(&self) -> usize {
        self.state.image_requests.load(Ordering::SeqCst)
    }

    /// Image requests received for one id.
    pub fn requests_for(&self, id: &str) -> usize {
        self.state.per_id.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    /// Changes the image content served for `id`.
    pub fn bump_version(&self, id: &str) {
        *self.state.versions.lock().unwrap().entry(id.to_string()).or_insert(0) += 1;
    }

    /// Pushes a change notice for `id` on the event stream.
    pub fn publish(&self, id: &str) {
        self.events_tx.send(format!("data: {}\n\n", id)).unwrap();
    }

    /// Pushes a raw chunk on the event stream.
    pub fn publish_raw(&self, chunk: &str) {
        self.events_tx.send(chunk.to_string()).unwrap();
    }
}

/// Content the healthy backend serves for `id` at `version`.
pub fn payload(id: &str, version: u32) -> Vec<u8> {
    format!("image-{}-v{}", id, version).into_bytes()
}

async fn image(State(state): State<BackendState>, Path(id): Path<String>) -> Response {
    state.image_requests.fetch_add(1, Ordering::SeqCst);
    *state.per_id.lock().unwrap().entry(id.clone()).or_insert(0) += 1;

    match state.behavior {
        Behavior::Failing => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Behavior::Html => (
            [(header::CONTENT_TYPE, "text/html")],
            "<html>maintenance</html>",
        )
            .into_response(),
        Behavior::Healthy => {
            let version = state.versions.lock().unwrap().get(&id).copied().unwrap_or(0);
            ([(header::CONTENT_TYPE, "image/jpeg")], payload(&id, version)).into_response()
        }
    }
}

async fn events(State(state): State<BackendState>) -> Response {
    let Some(rx) = state.events_rx.lock().await.take() else {
        return StatusCode::CONFLICT.into_response();
    };

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream),
    )
        .into_response()
}

/// An address nothing listens on.
pub fn closed_address() -> String {
    let socket = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();
    drop(socket);
    format!("http://127.0.0.1:{}", port)
}

/// Pool settings with tiny backoff so tests stay fast.
pub fn fast_settings() -> PoolSettings {
    PoolSettings {
        max_rounds: 3,
        backoff_unit: Duration::from_millis(1),
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_millis(500),
    }
}

/// Polls `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check().await
}
