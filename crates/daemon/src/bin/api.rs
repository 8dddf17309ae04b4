//! playlist-export-api - HTTP entry point of the export pipeline

use anyhow::{Context, Result};
use playlist_export_api_http::HttpServer;
use playlist_export_daemon::config::ApiConfig;
use playlist_export_daemon::telemetry::{self, TelemetryConfig};
use playlist_export_daemon::{bootstrap, VERSION};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let telemetry_config = TelemetryConfig::from_env("playlist-export-api")?;
    let _telemetry = telemetry::init(&telemetry_config)?;

    info!("Playlist export API v{} starting...", VERSION);

    // 2. Load configuration
    let config = ApiConfig::from_env().context("Invalid configuration")?;

    // 3. Open library store and broker
    let stores = bootstrap::open_stores(&config.stores).await?;

    // 4. Start HTTP server
    let state = bootstrap::api_state(&config, &stores);
    let server = HttpServer::new(config.http.clone(), state);

    info!("Press Ctrl+C to shutdown");
    server
        .start(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received. Draining requests..."),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
