//! Web server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::handlers::AppState;
use super::router::create_router;
use crate::config::Config;
use crate::{FiledropError, Result};

/// HTTP server for one storage backend.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server bound to `addr`.
    pub fn new(addr: SocketAddr, app_state: Arc<AppState>) -> Self {
        Self { addr, app_state }
    }

    /// Create a web server from a validated configuration.
    pub fn from_config(config: &Config, app_state: Arc<AppState>) -> Result<Self> {
        let addr = config.bind_addr().parse().map_err(|e| {
            FiledropError::Config(format!("invalid listen address {}: {e}", config.bind_addr()))
        })?;
        Ok(Self::new(addr, app_state))
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            backend = ?self.app_state.backend.kind(),
            "Web server listening on http://{}",
            local_addr
        );

        axum::serve(listener, create_router(self.app_state)).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = create_router(self.app_state);

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
