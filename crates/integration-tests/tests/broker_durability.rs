//! Broker Durability Integration Tests
//!
//! The SQLite broker on a real database file: messages, leases and dead
//! letters must survive the process going away.

use std::sync::Arc;

use playlist_export_core::application::LeaseRecovery;
use playlist_export_core::domain::EXPORT_QUEUE;
use playlist_export_core::error::AppError;
use playlist_export_core::port::id_provider::mocks::SequentialIdProvider;
use playlist_export_core::port::time_provider::mocks::ManualClock;
use playlist_export_core::port::MessageBroker;
use playlist_export_infra_sqlite::{create_pool, run_migrations, SqliteMessageBroker};
use sqlx::SqlitePool;

const LEASE_MS: i64 = 30_000;

/// One "process" holding the broker database open
struct Process {
    pool: SqlitePool,
    broker: Arc<SqliteMessageBroker>,
}

impl Process {
    async fn start(db_url: &str, clock: Arc<ManualClock>) -> Self {
        let pool = create_pool(db_url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let broker = Arc::new(SqliteMessageBroker::new(
            pool.clone(),
            clock,
            Arc::new(SequentialIdProvider::default()),
        ));
        broker.declare_queue(EXPORT_QUEUE).await.unwrap();

        Self { pool, broker }
    }

    /// Simulated crash: connections go away, nothing is settled
    async fn stop(self) {
        self.pool.close().await;
    }
}

fn db_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("broker.db").display())
}

/// Published messages survive a restart, in publish order
#[tokio::test]
async fn test_messages_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));

    let first = Process::start(&db_url(&dir), clock.clone()).await;
    first.broker.publish(EXPORT_QUEUE, r#"{"n":1}"#).await.unwrap();
    first.broker.publish(EXPORT_QUEUE, r#"{"n":2}"#).await.unwrap();
    first.stop().await;

    let second = Process::start(&db_url(&dir), clock).await;
    assert_eq!(second.broker.depth(EXPORT_QUEUE).await.unwrap().ready, 2);

    let a = second.broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap().unwrap();
    let b = second.broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap().unwrap();
    assert_eq!(a.body, r#"{"n":1}"#);
    assert_eq!(b.body, r#"{"n":2}"#);

    println!("✅ Broker data survives restart");
}

/// A consumer that dies mid-delivery leaves a lease that recovery returns
#[tokio::test]
async fn test_crashed_delivery_is_recovered_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));

    let first = Process::start(&db_url(&dir), clock.clone()).await;
    first.broker.publish(EXPORT_QUEUE, "{}").await.unwrap();
    let taken = first.broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap().unwrap();
    first.stop().await;

    let second = Process::start(&db_url(&dir), clock.clone()).await;
    let recovery = LeaseRecovery::new(second.broker.clone(), EXPORT_QUEUE);

    // Lease still valid: the message stays in flight
    assert_eq!(recovery.recover_expired_leases().await.unwrap(), 0);
    assert!(second.broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap().is_none());

    clock.advance(LEASE_MS + 1);
    assert_eq!(recovery.recover_expired_leases().await.unwrap(), 1);

    let again = second.broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap().unwrap();
    assert_eq!(again.id, taken.id);
    assert_eq!(again.attempts, 2);

    println!("✅ Expired lease recovered after restart");
}

/// Declaring the queue on every start neither fails nor drops messages
#[tokio::test]
async fn test_queue_declaration_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));

    let process = Process::start(&db_url(&dir), clock).await;
    process.broker.publish(EXPORT_QUEUE, "{}").await.unwrap();
    for _ in 0..3 {
        process.broker.declare_queue(EXPORT_QUEUE).await.unwrap();
    }
    assert_eq!(process.broker.depth(EXPORT_QUEUE).await.unwrap().ready, 1);
}

/// Undeclared queues refuse publishes rather than dropping them
#[tokio::test]
async fn test_publish_to_undeclared_queue_fails() {
    let dir = tempfile::tempdir().unwrap();
    let process = Process::start(&db_url(&dir), Arc::new(ManualClock::new(0))).await;

    let err = process.broker.publish("export:unknown", "{}").await.unwrap_err();
    assert!(matches!(err, AppError::BrokerUnavailable(_)));
}

/// Dead letters persist and can be requeued with a fresh attempt count
#[tokio::test]
async fn test_dead_letter_survives_restart_and_requeues() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));

    let first = Process::start(&db_url(&dir), clock.clone()).await;
    first.broker.publish(EXPORT_QUEUE, "{}").await.unwrap();
    let delivery = first.broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap().unwrap();
    first
        .broker
        .dead_letter(&delivery, "permanent failure: 550")
        .await
        .unwrap();
    first.stop().await;

    let second = Process::start(&db_url(&dir), clock).await;
    let dead = second.broker.list_dead_letters(EXPORT_QUEUE, 10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].reason, "permanent failure: 550");

    second.broker.requeue_dead_letter(&delivery.id).await.unwrap();
    let depth = second.broker.depth(EXPORT_QUEUE).await.unwrap();
    assert_eq!(depth.ready, 1);
    assert_eq!(depth.dead_lettered, 0);

    let redelivered = second.broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap().unwrap();
    assert_eq!(redelivered.attempts, 1);
}

/// Two processes on one database never receive the same message
#[tokio::test]
async fn test_competing_consumers_never_share_a_message() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));

    let a = Process::start(&db_url(&dir), clock.clone()).await;
    let b = Process::start(&db_url(&dir), clock).await;
    for n in 0..20 {
        a.broker
            .publish(EXPORT_QUEUE, &format!(r#"{{"n":{}}}"#, n))
            .await
            .unwrap();
    }

    let take_all = |broker: Arc<SqliteMessageBroker>| async move {
        let mut ids = Vec::new();
        while let Some(d) = broker.receive(EXPORT_QUEUE, LEASE_MS).await.unwrap() {
            ids.push(d.id);
        }
        ids
    };
    let (from_a, from_b) = tokio::join!(take_all(a.broker.clone()), take_all(b.broker.clone()));

    let mut all: Vec<String> = from_a.into_iter().chain(from_b).collect();
    assert_eq!(all.len(), 20);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 20);
}
