// Job Producer - hands validated export jobs to the broker

use crate::domain::{ExportJob, MessageId};
use crate::error::Result;
use crate::port::MessageBroker;
use std::sync::Arc;
use tracing::info;

pub struct ExportProducer {
    broker: Arc<dyn MessageBroker>,
    queue: String,
}

impl ExportProducer {
    pub fn new(broker: Arc<dyn MessageBroker>, queue: impl Into<String>) -> Self {
        Self {
            broker,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Publish `job` and return once the broker confirms it.
    ///
    /// Preconditions: email already validated, ownership already verified.
    /// Broker failures surface as `BrokerUnavailable`.
    pub async fn submit(&self, job: &ExportJob) -> Result<MessageId> {
        let body = job.to_message_body()?;

        self.broker.declare_queue(&self.queue).await?;
        let message_id = self.broker.publish(&self.queue, &body).await?;

        info!(
            message_id = %message_id,
            queue = %self.queue,
            playlist_id = %job.playlist_id,
            "Export job published"
        );
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EXPORT_QUEUE;
    use crate::error::AppError;
    use crate::port::message_broker::mocks::InMemoryBroker;

    #[tokio::test]
    async fn test_submit_declares_and_publishes() {
        let broker = Arc::new(InMemoryBroker::default());
        let producer = ExportProducer::new(broker.clone(), EXPORT_QUEUE);

        producer
            .submit(&ExportJob::new("playlist-abc", "user-1", "a@b.com"))
            .await
            .unwrap();
        producer
            .submit(&ExportJob::new("playlist-abc", "user-1", "c@d.com"))
            .await
            .unwrap();

        let bodies = broker.pending_bodies(EXPORT_QUEUE);
        assert_eq!(bodies.len(), 2);
        assert_eq!(
            bodies[0],
            r#"{"playlistId":"playlist-abc","userId":"user-1","targetEmail":"a@b.com"}"#
        );
    }

    #[tokio::test]
    async fn test_broker_outage_is_surfaced() {
        let broker = Arc::new(InMemoryBroker::default());
        broker.set_unavailable(true);
        let producer = ExportProducer::new(broker, EXPORT_QUEUE);

        let err = producer
            .submit(&ExportJob::new("playlist-abc", "user-1", "a@b.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BrokerUnavailable(_)));
    }
}
