// Export Service - synchronous half of the pipeline (gate, then produce)

use crate::application::{ExportProducer, OwnershipGate};
use crate::domain::{ExportJob, MessageId};
use crate::error::Result;
use std::sync::Arc;

pub struct ExportService {
    gate: Arc<OwnershipGate>,
    producer: Arc<ExportProducer>,
}

impl ExportService {
    pub fn new(gate: Arc<OwnershipGate>, producer: Arc<ExportProducer>) -> Self {
        Self { gate, producer }
    }

    /// Queue an export of `playlist_id` for `requester_id`.
    ///
    /// Nothing is published unless the ownership check passes first.
    pub async fn request_export(
        &self,
        playlist_id: &str,
        requester_id: &str,
        target_email: &str,
    ) -> Result<MessageId> {
        self.gate.verify_owner(playlist_id, requester_id).await?;

        let job = ExportJob::new(playlist_id, requester_id, target_email);
        self.producer.submit(&job).await
    }
}
