//! Dependency wiring (constructor injection, built once per process)

use crate::config::{ApiConfig, ConsumerSettings, MailTransport, StoreConfig};
use anyhow::{Context, Result};
use playlist_export_api_http::{AppState, JwtDecoder};
use playlist_export_core::application::{
    DeliverySupervisor, ExportConsumer, ExportProducer, ExportService, LeaseRecovery,
    OwnershipGate, PlaylistAggregator,
};
use playlist_export_core::domain::EXPORT_QUEUE;
use playlist_export_core::port::id_provider::UuidProvider;
use playlist_export_core::port::time_provider::SystemTimeProvider;
use playlist_export_core::port::{Mailer, MessageBroker, PlaylistRepository};
use playlist_export_infra_mail::{HttpMailer, OutboxMailer};
use playlist_export_infra_sqlite::{
    create_pool, run_migrations, SqliteMessageBroker, SqlitePlaylistRepository,
};
use std::sync::Arc;
use tracing::info;

/// Library store and broker, opened and migrated
pub struct Stores {
    pub playlists: Arc<dyn PlaylistRepository>,
    pub broker: Arc<dyn MessageBroker>,
}

/// Open both databases; failure here is fatal to the process
pub async fn open_stores(config: &StoreConfig) -> Result<Stores> {
    config
        .prepare_directories()
        .context("Failed to create database directories")?;

    info!(database_url = %config.database_url, "Opening library database...");
    let library_pool = create_pool(&config.database_url)
        .await
        .context("Library database pool creation failed")?;
    run_migrations(&library_pool)
        .await
        .context("Library database migration failed")?;

    info!(broker_url = %config.broker_url, "Connecting to broker...");
    let broker_pool = create_pool(&config.broker_url)
        .await
        .context("Broker connection failed")?;
    run_migrations(&broker_pool)
        .await
        .context("Broker migration failed")?;

    let broker = Arc::new(SqliteMessageBroker::new(
        broker_pool,
        Arc::new(SystemTimeProvider),
        Arc::new(UuidProvider),
    ));
    broker
        .declare_queue(EXPORT_QUEUE)
        .await
        .context("Failed to declare export queue")?;

    Ok(Stores {
        playlists: Arc::new(SqlitePlaylistRepository::new(library_pool)),
        broker,
    })
}

/// Handler state for `playlist-export-api`
pub fn api_state(config: &ApiConfig, stores: &Stores) -> AppState {
    let gate = Arc::new(OwnershipGate::new(stores.playlists.clone()));
    let producer = Arc::new(ExportProducer::new(stores.broker.clone(), EXPORT_QUEUE));
    let export_service = Arc::new(ExportService::new(gate, producer));

    AppState::new(
        export_service,
        stores.broker.clone(),
        EXPORT_QUEUE,
        JwtDecoder::new(&config.access_token_key),
    )
    .with_admin_key(config.admin_key.clone())
}

pub fn mailer(transport: &MailTransport) -> Result<Arc<dyn Mailer>> {
    Ok(match transport {
        MailTransport::Outbox { dir, from } => {
            info!(dir = %dir.display(), "Using outbox mail transport");
            Arc::new(OutboxMailer::new(dir.clone(), from.clone()))
        }
        MailTransport::Http(http) => {
            info!(api_url = %http.api_url, "Using HTTP mail transport");
            Arc::new(HttpMailer::new(http.clone()).context("Failed to create mail client")?)
        }
    })
}

/// Consumer plus the lease recovery that runs beside it
pub fn consumer(
    settings: &ConsumerSettings,
    stores: &Stores,
    mailer: Arc<dyn Mailer>,
) -> (Arc<ExportConsumer>, LeaseRecovery) {
    let supervisor = Arc::new(DeliverySupervisor::new(
        stores.broker.clone(),
        settings.retry_policy.clone(),
    ));
    let aggregator = Arc::new(PlaylistAggregator::new(stores.playlists.clone()));

    let consumer = Arc::new(ExportConsumer::new(
        settings.consumer.clone(),
        stores.broker.clone(),
        aggregator,
        mailer,
        supervisor,
    ));
    let recovery = LeaseRecovery::new(stores.broker.clone(), settings.consumer.queue.clone());

    (consumer, recovery)
}
