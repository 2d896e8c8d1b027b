// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! PDF Upload Gateway Service
//!
//! Accepts anonymous PDF uploads and answers with signed view and download
//! links.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and an optional
//! `.env` file):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `MAX_UPLOADS_PER_WINDOW`: Uploads per client per window (default: 5)
//! - `RATE_WINDOW_SECS`: Rate window length (default: 3600)
//! - `MAX_FILE_SIZE_BYTES`: Largest accepted file (default: 5 MiB)
//! - `STORAGE_BACKEND`: `filesystem` or `memory` (default: filesystem)
//! - `STORAGE_ROOT`: Filesystem store root (default: ./uploads)
//! - `PUBLIC_BASE_URL`: Root of issued links (default: http://localhost:8080/files/)
//! - `URL_SIGNING_SECRET`: Link signing secret (default: random per process)
//! - `GRANT_TTL_SECS`: Link lifetime (default: one year)
//! - `COMPENSATE_ORPHANS`: Delete objects whose links failed (default: false)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pdf_upload_gateway::{
    clock::{Clock, SystemClock},
    config::{Config, StorageBackend},
    handlers::{router, AppState},
    metrics::GatewayMetrics,
    storage::{FsStore, MemoryStore, ObjectStore, UrlSigner},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        max_per_window = config.rate_limit.max_per_window,
        window_secs = config.rate_limit.window_secs,
        max_file_size = config.validation.max_file_size,
        backend = ?config.storage.backend,
        "Starting PDF upload gateway"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let signer = Arc::new(UrlSigner::new(
        &config.signing_secret(),
        &config.storage.public_base_url,
        clock.clone(),
    )?);

    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::Filesystem => {
            Arc::new(FsStore::open(&config.storage.root_dir, signer.clone()).await?)
        }
        StorageBackend::Memory => Arc::new(MemoryStore::new(signer.clone())),
    };

    // Create application state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        signer,
        clock,
        GatewayMetrics::new()?,
    ));

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup_interval = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let limiter = cleanup_state.gateway.limiter();
            limiter.cleanup().await;
            cleanup_state
                .metrics()
                .set_rate_limit_windows(limiter.tracked_keys().await);
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
