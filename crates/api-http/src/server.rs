//! HTTP Server
//!
//! Binds a TCP listener and serves the router until the shutdown future
//! resolves. In-flight requests are drained before `serve` returns.

use crate::router::build_router;
use crate::state::AppState;
use playlist_export_core::error::AppError;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 5000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind the configured address.
    ///
    /// Split from [`HttpServer::serve`] so callers learn the bound address
    /// (port 0 picks an ephemeral one) before requests start flowing.
    pub async fn bind(&self) -> Result<TcpListener, AppError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind HTTP server on {}: {}", addr, e)))
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: SocketAddr = listener.local_addr()?;
        let admin_enabled = self.state.admin_key.is_some();

        info!(
            addr = %local_addr,
            admin_routes = admin_enabled,
            "HTTP server listening"
        );

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Bind and serve in one call
    pub async fn start<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting HTTP server"
        );

        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }
}
