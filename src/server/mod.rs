//! HTTP API server

pub mod error;
pub mod routes;

use crate::core::Downloader;
use crate::error::VidmuxError;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

pub use error::ApiError;
pub use routes::{router, AppState};

/// Default listen address
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl ServerConfig {
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }
}

/// Serve the API until Ctrl+C
pub async fn serve(config: ServerConfig, downloader: Downloader) -> Result<(), VidmuxError> {
    let app = router(AppState { downloader });
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
