// Export Consumer - delivery loop for the export queue

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::supervisor::{DeliverySupervisor, FailureKind, ProcessOutcome};
use crate::application::PlaylistAggregator;
use crate::domain::{
    Delivery, DiscardReason, DomainError, ExportJob, ExportTask, MessageId, EXPORT_QUEUE,
};
use crate::error::{AppError, Result};
use crate::port::{DeliveryError, Mailer, MessageBroker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

/// When a delivery is acknowledged to the broker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckMode {
    /// Ack as soon as the message arrives (at-most-once; failures are lost)
    OnDelivery,
    /// Ack only after the mailer confirms; failures go to the supervisor
    #[default]
    AfterProcessing,
}

impl std::str::FromStr for AckMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "on-delivery" => Ok(AckMode::OnDelivery),
            "after-processing" => Ok(AckMode::AfterProcessing),
            other => Err(AppError::Config(format!(
                "Unknown ack mode '{}' (expected on-delivery or after-processing)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub queue: String,
    /// Delivery slots processed in parallel (at least 1)
    pub concurrency: usize,
    pub ack_mode: AckMode,
    pub processing_timeout: Duration,
    pub lease_ms: i64,
    pub idle_poll: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            queue: EXPORT_QUEUE.to_string(),
            concurrency: 1,
            ack_mode: AckMode::default(),
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
            lease_ms: DEFAULT_LEASE_MS,
            idle_poll: IDLE_POLL_DURATION,
        }
    }
}

/// Subscriber bound to the export queue
pub struct ExportConsumer {
    config: ConsumerConfig,
    broker: Arc<dyn MessageBroker>,
    aggregator: Arc<PlaylistAggregator>,
    mailer: Arc<dyn Mailer>,
    supervisor: Arc<DeliverySupervisor>,
}

impl ExportConsumer {
    pub fn new(
        config: ConsumerConfig,
        broker: Arc<dyn MessageBroker>,
        aggregator: Arc<PlaylistAggregator>,
        mailer: Arc<dyn Mailer>,
        supervisor: Arc<DeliverySupervisor>,
    ) -> Self {
        Self {
            config,
            broker,
            aggregator,
            mailer,
            supervisor,
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Run `concurrency` delivery slots until shutdown.
    ///
    /// Returns once every slot has finished its current delivery.
    pub async fn run(self: Arc<Self>, shutdown: ShutdownToken) -> Result<()> {
        self.broker.declare_queue(&self.config.queue).await?;

        let concurrency = self.config.concurrency.max(1);
        info!(
            queue = %self.config.queue,
            concurrency = concurrency,
            ack_mode = ?self.config.ack_mode,
            "Export consumer started"
        );

        let mut slots = JoinSet::new();
        for slot in 0..concurrency {
            let consumer = Arc::clone(&self);
            let token = shutdown.clone();
            slots.spawn(async move { consumer.run_slot(slot, token).await });
        }

        while let Some(joined) = slots.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Consumer slot aborted");
            }
        }

        info!(queue = %self.config.queue, "Export consumer stopped");
        Ok(())
    }

    async fn run_slot(&self, slot: usize, mut shutdown: ShutdownToken) {
        let mut published = self.broker.subscribe_publishes();
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            // Mark publishes seen before receiving so none slip past an empty receive
            if let Some(rx) = published.as_mut() {
                rx.borrow_and_update();
            }
            match self.process_next().await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    // Nothing ready: wait for a publish, the idle poll, or shutdown
                    tokio::select! {
                        _ = wait_for_publish(published.as_mut(), self.config.idle_poll) => {},
                        _ = shutdown.wait() => break,
                    }
                }
                Err(e) => {
                    error!(slot = slot, error = %e, "Consumer slot error");
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => break,
                    }
                }
            }
        }
        info!(slot = slot, "Consumer slot stopped");
    }

    /// Receive and fully handle one delivery.
    ///
    /// Returns `None` when nothing is ready. Broker errors are returned;
    /// processing errors are folded into the outcome.
    pub async fn process_next(&self) -> Result<Option<ProcessOutcome>> {
        let delivery = match self
            .broker
            .receive(&self.config.queue, self.config.lease_ms)
            .await?
        {
            Some(d) => d,
            None => return Ok(None),
        };

        info!(
            message_id = %delivery.id,
            attempt = %delivery.attempts,
            "Export delivery received"
        );

        if self.config.ack_mode == AckMode::OnDelivery {
            self.broker.ack(&delivery).await?;
        }

        let outcome = self.process_isolated(&delivery).await;

        match self.config.ack_mode {
            AckMode::AfterProcessing => {
                match self.supervisor.settle(&delivery, outcome.clone()).await {
                    Ok(_) => {}
                    // Lease expired mid-processing; the message belongs to its next holder
                    Err(AppError::NotFound(e)) => warn!(
                        message_id = %delivery.id,
                        attempt = %delivery.attempts,
                        error = %e,
                        "Lease lost before settlement"
                    ),
                    Err(e) => return Err(e),
                }
            }
            AckMode::OnDelivery => log_unacknowledged_outcome(&delivery, &outcome),
        }

        Ok(Some(outcome))
    }

    /// Run the delivery on its own task under the processing timeout.
    ///
    /// A panic is a permanent failure; a timeout is a transient one.
    async fn process_isolated(&self, delivery: &Delivery) -> ProcessOutcome {
        let aggregator = Arc::clone(&self.aggregator);
        let mailer = Arc::clone(&self.mailer);
        let message_id = delivery.id.clone();
        let attempt = delivery.attempts;
        let body = delivery.body.clone();

        let handle = tokio::task::spawn(async move {
            Self::process_delivery(&aggregator, mailer.as_ref(), message_id, attempt, &body).await
        });
        let abort = handle.abort_handle();

        match timeout(self.config.processing_timeout, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) if join_err.is_panic() => {
                let panic_msg = panic_message(join_err.into_panic());
                error!(
                    message_id = %delivery.id,
                    panic_msg = %panic_msg,
                    "Export processing panicked"
                );
                ProcessOutcome::Failed(FailureKind::Permanent(format!("panicked: {}", panic_msg)))
            }
            Ok(Err(join_err)) => {
                warn!(message_id = %delivery.id, error = %join_err, "Export processing cancelled");
                ProcessOutcome::Failed(FailureKind::Transient("processing cancelled".to_string()))
            }
            Err(_) => {
                abort.abort();
                warn!(
                    message_id = %delivery.id,
                    timeout_ms = self.config.processing_timeout.as_millis() as u64,
                    "Export processing timed out"
                );
                ProcessOutcome::Failed(FailureKind::Transient(format!(
                    "processing timed out after {}ms",
                    self.config.processing_timeout.as_millis()
                )))
            }
        }
    }

    /// Parse, aggregate, and mail one delivery.
    ///
    /// Static so the spawned task owns nothing but `Arc`s and the body.
    async fn process_delivery(
        aggregator: &PlaylistAggregator,
        mailer: &dyn Mailer,
        message_id: MessageId,
        attempt: i32,
        body: &str,
    ) -> ProcessOutcome {
        let mut task = ExportTask::received(message_id, attempt);
        Self::drive(&mut task, aggregator, mailer, body)
            .await
            .unwrap_or_else(|e| ProcessOutcome::Failed(FailureKind::Permanent(e.to_string())))
    }

    async fn drive(
        task: &mut ExportTask,
        aggregator: &PlaylistAggregator,
        mailer: &dyn Mailer,
        body: &str,
    ) -> std::result::Result<ProcessOutcome, DomainError> {
        let job = match ExportJob::from_message_body(body) {
            Ok(job) => job,
            Err(e) => {
                task.discard()?;
                warn!(message_id = %task.message_id, error = %e, "Discarding malformed export message");
                return Ok(ProcessOutcome::Discarded(DiscardReason::MalformedMessage(
                    e.to_string(),
                )));
            }
        };

        task.begin_aggregating(job.clone())?;
        let payload = match aggregator.aggregate(&job.playlist_id).await {
            Ok(payload) => payload,
            Err(AppError::NotFound(_)) => {
                task.discard()?;
                warn!(
                    message_id = %task.message_id,
                    playlist_id = %job.playlist_id,
                    "Playlist vanished before export"
                );
                return Ok(ProcessOutcome::Discarded(DiscardReason::PlaylistNotFound(
                    job.playlist_id,
                )));
            }
            Err(e) => {
                warn!(message_id = %task.message_id, error = %e, "Playlist aggregation failed");
                return Ok(ProcessOutcome::Failed(FailureKind::Transient(e.to_string())));
            }
        };

        let rendered = payload
            .to_json()
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        task.begin_delivering()?;
        match mailer.send(&job.target_email, &rendered).await {
            Ok(receipt) => {
                task.complete()?;
                Ok(ProcessOutcome::Completed(receipt))
            }
            Err(e) => {
                warn!(
                    message_id = %task.message_id,
                    state = %task.state(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Export mail delivery failed"
                );
                Ok(ProcessOutcome::Failed(match e {
                    DeliveryError::Transient(msg) => FailureKind::Transient(msg),
                    DeliveryError::Permanent(msg) => FailureKind::Permanent(msg),
                }))
            }
        }
    }
}

/// Wait for the next publish, falling back to the idle poll
async fn wait_for_publish(published: Option<&mut watch::Receiver<u64>>, max_wait: Duration) {
    match published {
        Some(rx) => {
            if let Ok(Err(_)) = timeout(max_wait, rx.changed()).await {
                // Broker dropped its sender: plain polling from here on
                sleep(max_wait).await;
            }
        }
        None => sleep(max_wait).await,
    }
}

/// In at-most-once mode the broker already forgot the message
fn log_unacknowledged_outcome(delivery: &Delivery, outcome: &ProcessOutcome) {
    match outcome {
        ProcessOutcome::Completed(receipt) => info!(
            message_id = %delivery.id,
            recipient = %receipt.recipient,
            transport_id = ?receipt.transport_id,
            "Export delivered"
        ),
        ProcessOutcome::Discarded(reason) => warn!(
            message_id = %delivery.id,
            reason = %reason,
            "Export discarded"
        ),
        ProcessOutcome::Failed(failure) => error!(
            message_id = %delivery.id,
            failure = %failure,
            "Export failed after acknowledgment; job is lost"
        ),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ExportProducer, ExportService, OwnershipGate, RetryPolicy};
    use crate::domain::ExportPayload;
    use crate::port::mailer::mocks::{MockBehavior, MockMailer};
    use crate::port::message_broker::mocks::InMemoryBroker;
    use crate::port::playlist_repository::mocks::InMemoryPlaylistRepository;
    use crate::port::time_provider::mocks::ManualClock;

    struct Fixture {
        repo: Arc<InMemoryPlaylistRepository>,
        broker: Arc<InMemoryBroker>,
        clock: Arc<ManualClock>,
        mailer: Arc<MockMailer>,
        service: ExportService,
        consumer: Arc<ExportConsumer>,
    }

    fn fixture(mailer: MockMailer, config: ConsumerConfig) -> Fixture {
        let repo = Arc::new(InMemoryPlaylistRepository::new());
        repo.add_user("user-1", "dicoding");
        repo.add_playlist("playlist-abc", "Road trip", "user-1");
        repo.add_song("playlist-abc", "s1", "Fix You", "Coldplay");
        repo.add_song("playlist-abc", "s2", "Yellow", "Coldplay");

        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let broker = Arc::new(InMemoryBroker::new(clock.clone()));
        let mailer = Arc::new(mailer);

        let service = ExportService::new(
            Arc::new(OwnershipGate::new(repo.clone())),
            Arc::new(ExportProducer::new(broker.clone(), EXPORT_QUEUE)),
        );
        let supervisor = Arc::new(DeliverySupervisor::new(
            broker.clone(),
            RetryPolicy::default(),
        ));
        let consumer = Arc::new(ExportConsumer::new(
            config,
            broker.clone(),
            Arc::new(PlaylistAggregator::new(repo.clone())),
            mailer.clone(),
            supervisor,
        ));

        Fixture {
            repo,
            broker,
            clock,
            mailer,
            service,
            consumer,
        }
    }

    fn legacy() -> ConsumerConfig {
        ConsumerConfig {
            ack_mode: AckMode::OnDelivery,
            ..ConsumerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_owner_export_is_mailed_once() {
        let f = fixture(MockMailer::new_success(), ConsumerConfig::default());
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        let outcome = f.consumer.process_next().await.unwrap().unwrap();
        assert!(matches!(outcome, ProcessOutcome::Completed(_)));

        let sent = f.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].target_email, "a@b.com");

        let payload: ExportPayload = serde_json::from_str(&sent[0].body).unwrap();
        assert_eq!(payload.id, "playlist-abc");
        let ids: Vec<&str> = payload.songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);

        assert_eq!(f.broker.depth(EXPORT_QUEUE).await.unwrap().pending(), 0);
        assert!(f.consumer.process_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_owner_never_reaches_mailer() {
        let f = fixture(MockMailer::new_success(), ConsumerConfig::default());
        let err = f
            .service
            .request_export("playlist-abc", "user-2", "a@b.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        assert!(f.consumer.process_next().await.unwrap().is_none());
        assert_eq!(f.mailer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_legacy_mode_loses_failed_job() {
        let f = fixture(MockMailer::new_transient("smtp timeout"), legacy());
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        let outcome = f.consumer.process_next().await.unwrap().unwrap();
        assert!(matches!(
            outcome,
            ProcessOutcome::Failed(FailureKind::Transient(_))
        ));

        f.clock.advance(DEFAULT_MAX_RETRY_DELAY_MS);
        assert!(f.consumer.process_next().await.unwrap().is_none());

        let depth = f.broker.depth(EXPORT_QUEUE).await.unwrap();
        assert_eq!(depth.pending(), 0);
        assert_eq!(depth.dead_lettered, 0);
        assert_eq!(f.mailer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_then_dead_letter() {
        let f = fixture(
            MockMailer::new_transient("smtp timeout"),
            ConsumerConfig::default(),
        );
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        f.consumer.process_next().await.unwrap().unwrap();
        let depth = f.broker.depth(EXPORT_QUEUE).await.unwrap();
        assert_eq!(depth.ready, 1, "failed job stays queued for retry");

        // Backoff not elapsed yet
        assert!(f.consumer.process_next().await.unwrap().is_none());

        for _ in 1..DEFAULT_MAX_ATTEMPTS {
            f.clock.advance(DEFAULT_MAX_RETRY_DELAY_MS);
            f.consumer.process_next().await.unwrap().unwrap();
        }

        let depth = f.broker.depth(EXPORT_QUEUE).await.unwrap();
        assert_eq!(depth.pending(), 0);
        assert_eq!(depth.dead_lettered, 1);
        assert_eq!(f.mailer.call_count(), DEFAULT_MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let mailer = MockMailer::new_success()
            .with_script([MockBehavior::Transient("connection reset".into())]);
        let f = fixture(mailer, ConsumerConfig::default());
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        f.consumer.process_next().await.unwrap().unwrap();
        f.clock.advance(2_000);
        let outcome = f.consumer.process_next().await.unwrap().unwrap();

        assert!(matches!(outcome, ProcessOutcome::Completed(_)));
        assert_eq!(f.mailer.sent().len(), 1);
        let depth = f.broker.depth(EXPORT_QUEUE).await.unwrap();
        assert_eq!(depth.pending(), 0);
        assert_eq!(depth.dead_lettered, 0);
    }

    #[tokio::test]
    async fn test_vanished_playlist_is_discarded() {
        let f = fixture(MockMailer::new_success(), ConsumerConfig::default());
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();
        f.repo.remove_playlist("playlist-abc");

        let outcome = f.consumer.process_next().await.unwrap().unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Discarded(DiscardReason::PlaylistNotFound("playlist-abc".into()))
        );
        assert_eq!(f.mailer.call_count(), 0);
        let depth = f.broker.depth(EXPORT_QUEUE).await.unwrap();
        assert_eq!(depth.pending(), 0);
        assert_eq!(depth.dead_lettered, 0);
    }

    #[tokio::test]
    async fn test_malformed_message_is_dead_lettered() {
        let f = fixture(MockMailer::new_success(), ConsumerConfig::default());
        f.broker.declare_queue(EXPORT_QUEUE).await.unwrap();
        f.broker.publish(EXPORT_QUEUE, "not json").await.unwrap();

        let outcome = f.consumer.process_next().await.unwrap().unwrap();

        assert!(matches!(
            outcome,
            ProcessOutcome::Discarded(DiscardReason::MalformedMessage(_))
        ));
        assert_eq!(f.mailer.call_count(), 0);
        assert_eq!(f.broker.depth(EXPORT_QUEUE).await.unwrap().dead_lettered, 1);
    }

    #[tokio::test]
    async fn test_store_outage_is_retried() {
        let f = fixture(MockMailer::new_success(), ConsumerConfig::default());
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();
        f.repo.fail_reads("database is locked");

        let outcome = f.consumer.process_next().await.unwrap().unwrap();

        assert!(matches!(
            outcome,
            ProcessOutcome::Failed(FailureKind::Transient(_))
        ));
        assert_eq!(f.broker.depth(EXPORT_QUEUE).await.unwrap().ready, 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_transient_failure() {
        let config = ConsumerConfig {
            processing_timeout: Duration::from_millis(20),
            ..ConsumerConfig::default()
        };
        let f = fixture(
            MockMailer::new(MockBehavior::Hang(Duration::from_secs(5))),
            config,
        );
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        let outcome = f.consumer.process_next().await.unwrap().unwrap();

        match outcome {
            ProcessOutcome::Failed(FailureKind::Transient(msg)) => {
                assert!(msg.contains("timed out"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(f.broker.depth(EXPORT_QUEUE).await.unwrap().ready, 1);
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_panic_is_isolated_and_dead_lettered() {
        let f = fixture(
            MockMailer::new(MockBehavior::Panic("mailer exploded".into())),
            ConsumerConfig::default(),
        );
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        let outcome = f.consumer.process_next().await.unwrap().unwrap();

        match outcome {
            ProcessOutcome::Failed(FailureKind::Permanent(msg)) => {
                assert!(msg.contains("mailer exploded"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let dead = f.broker.list_dead_letters(EXPORT_QUEUE, 10).await.unwrap();
        assert_eq!(dead.len(), 1);
    }

    #[tokio::test]
    async fn test_broker_outage_is_an_error_not_a_panic() {
        let f = fixture(MockMailer::new_success(), ConsumerConfig::default());
        f.broker.set_unavailable(true);
        assert!(matches!(
            f.consumer.process_next().await,
            Err(AppError::BrokerUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_run_drains_queue_and_stops_on_shutdown() {
        let config = ConsumerConfig {
            concurrency: 2,
            idle_poll: Duration::from_millis(10),
            ..ConsumerConfig::default()
        };
        let f = fixture(MockMailer::new_success(), config);
        for email in ["a@b.com", "c@d.com", "e@f.com"] {
            f.service
                .request_export("playlist-abc", "user-1", email)
                .await
                .unwrap();
        }

        let (sender, token) = shutdown_channel();
        let handle = tokio::spawn(Arc::clone(&f.consumer).run(token));

        tokio::time::timeout(Duration::from_secs(5), async {
            while f.mailer.sent().len() < 3 {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("all exports delivered");

        sender.shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("consumer stops")
            .unwrap()
            .unwrap();

        assert_eq!(f.broker.depth(EXPORT_QUEUE).await.unwrap().pending(), 0);
    }

    #[tokio::test]
    async fn test_idle_slot_wakes_on_publish() {
        let config = ConsumerConfig {
            idle_poll: Duration::from_secs(60),
            ..ConsumerConfig::default()
        };
        let f = fixture(MockMailer::new_success(), config);

        let (sender, token) = shutdown_channel();
        let handle = tokio::spawn(Arc::clone(&f.consumer).run(token));
        sleep(Duration::from_millis(50)).await;

        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while f.mailer.sent().is_empty() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("export delivered well before the idle poll");

        sender.shutdown();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_publish_before_wait_is_not_missed() {
        let f = fixture(MockMailer::new_success(), ConsumerConfig::default());
        f.broker.declare_queue(EXPORT_QUEUE).await.unwrap();
        let mut published = f.broker.subscribe_publishes().unwrap();
        published.borrow_and_update();

        assert!(f.consumer.process_next().await.unwrap().is_none());
        f.service
            .request_export("playlist-abc", "user-1", "a@b.com")
            .await
            .unwrap();

        tokio_test::assert_ok!(
            tokio::time::timeout(
                Duration::from_secs(1),
                wait_for_publish(Some(&mut published), Duration::from_secs(60)),
            )
            .await
        );
    }

    #[test]
    fn test_ack_mode_parsing() {
        assert_eq!("on-delivery".parse::<AckMode>().unwrap(), AckMode::OnDelivery);
        assert_eq!(
            "after-processing".parse::<AckMode>().unwrap(),
            AckMode::AfterProcessing
        );
        assert!("sometimes".parse::<AckMode>().is_err());
        assert_eq!(AckMode::default(), AckMode::AfterProcessing);
    }
}
