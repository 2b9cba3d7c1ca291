//! Image Cache - client-side cache for a replicated image backend
//!
//! Runs a cache client with its invalidation listeners and exposes it over
//! a small HTTP facade.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_cache::api::create_router;
use image_cache::{AppState, Config};

/// Main entry point for the image cache client.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache client (store + backend pool)
/// 4. Start one invalidation listener per backend replica
/// 5. Serve the HTTP facade on the configured port
/// 6. On SIGINT/SIGTERM stop the listeners and exit
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting image cache client");

    let config = Config::from_env();
    info!(
        "Configuration loaded: policy={}, capacity={}, ttl={:?}, backends={:?}, local_dir={:?}, port={}",
        config.policy,
        config.capacity,
        config.ttl,
        config.backend_urls,
        config.local_image_dir,
        config.server_port
    );

    let state = AppState::from_config(&config).context("Failed to create cache client")?;
    let client = state.client.clone();
    client.spawn_listeners(config.listener_settings()).await;

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    for (address, outcome) in client.shutdown().await {
        if let Err(e) = outcome {
            warn!(replica = %address, error = %e, "Listener ended with error");
        }
    }
    client.evaluate_performance().await;

    if let Err(e) = &served {
        error!("{:#}", e);
    }
    info!("Shutdown complete");
    served
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
