//! playlist-export-consumer - drains the export queue and mails payloads

use anyhow::{Context, Result};
use playlist_export_core::application::shutdown_channel;
use playlist_export_daemon::config::ConsumerSettings;
use playlist_export_daemon::telemetry::{self, TelemetryConfig};
use playlist_export_daemon::{bootstrap, VERSION};
use std::time::Duration;
use tracing::{error, info, warn};

/// How long in-flight deliveries get to finish after Ctrl+C
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let telemetry_config = TelemetryConfig::from_env("playlist-export-consumer")?;
    let _telemetry = telemetry::init(&telemetry_config)?;

    info!("Playlist export consumer v{} starting...", VERSION);

    // 2. Load configuration
    let settings = ConsumerSettings::from_env().context("Invalid configuration")?;

    // 3. Open library store and broker
    let stores = bootstrap::open_stores(&settings.stores).await?;
    let mailer = bootstrap::mailer(&settings.mail)?;
    let (consumer, recovery) = bootstrap::consumer(&settings, &stores, mailer);

    // 4. Return deliveries orphaned by a previous crash
    info!("Running lease recovery...");
    match recovery.recover_expired_leases().await {
        Ok(count) => info!(recovered = count, "Lease recovery completed"),
        Err(e) => error!(error = %e, "Lease recovery failed"),
    }

    // 5. Start consumer slots and the periodic recovery sweep
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let recovery_handle = tokio::spawn(recovery.run(settings.recovery_interval, shutdown_rx.clone()));
    let consumer_handle = tokio::spawn(async move {
        if let Err(e) = consumer.run(shutdown_rx).await {
            error!(error = %e, "Export consumer failed");
        }
    });

    info!("System ready. Waiting for export jobs...");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Finishing in-flight deliveries...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    match tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, consumer_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Export consumer task aborted"),
        Err(_) => warn!(
            grace_secs = SHUTDOWN_GRACE_PERIOD.as_secs(),
            "Consumer did not stop in time; leases will be recovered on next start"
        ),
    }
    if let Err(e) = recovery_handle.await {
        error!(error = %e, "Lease recovery task aborted");
    }

    info!("Shutdown complete.");
    Ok(())
}
