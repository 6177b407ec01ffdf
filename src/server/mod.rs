//! Local preview server
//!
//! Serves the dist tree over HTTP and pushes reload events to connected
//! browsers over a WebSocket channel. The watch dispatcher feeds the
//! reload broadcast; this module only forwards it.

pub mod live_reload;
pub mod static_files;

pub use live_reload::ReloadEvent;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::sync::broadcast;

/// Error starting or running the preview server
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// Failed to bind or serve
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// State shared across all request handlers.
pub(crate) struct AppState {
    /// Directory the built assets are served from
    pub(crate) dist_dir: PathBuf,
    /// Broadcast channel for reload events
    pub(crate) reload_tx: broadcast::Sender<ReloadEvent>,
}

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/__livereload", get(live_reload::ws_handler))
        .route("/__livereload.js", get(live_reload::client_script))
        .fallback(static_files::serve_asset)
        .with_state(state)
}

/// Run the preview server until shutdown.
///
/// # Arguments
///
/// * `config` - Host and port to bind
/// * `dist_dir` - Directory to serve
/// * `reload_tx` - Broadcast channel the watch dispatcher publishes on
pub async fn run_server(
    config: crate::config::ServerConfig,
    dist_dir: PathBuf,
    reload_tx: broadcast::Sender<ReloadEvent>,
) -> Result<(), ServerError> {
    let state = Arc::new(AppState { dist_dir, reload_tx });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Preview server listening");
    println!("Preview server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received, stopping preview server...");
}
