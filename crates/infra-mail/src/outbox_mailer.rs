// Local outbox transport (development)
//
// Every export mail becomes one JSON file in the outbox directory.

use async_trait::async_trait;
use playlist_export_core::port::{DeliveryError, DeliveryReceipt, Mailer};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::message::{validate_address, MailMessage};

pub struct OutboxMailer {
    dir: PathBuf,
    from: String,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            from: from.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, target_email: &str, body: &str) -> Result<DeliveryReceipt, DeliveryError> {
        validate_address(target_email)?;

        let message = MailMessage::export(&self.from, target_email, body);
        let contents = serde_json::to_vec_pretty(&message)
            .map_err(|e| DeliveryError::Permanent(format!("unrenderable message: {}", e)))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DeliveryError::Transient(format!("outbox unavailable: {}", e)))?;

        let file_name = format!(
            "{}-{}.json",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ"),
            uuid::Uuid::new_v4()
        );
        let path = self.dir.join(&file_name);

        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| DeliveryError::Transient(format!("outbox write failed: {}", e)))?;

        info!(path = %path.display(), recipient = %target_email, "Export written to outbox");

        Ok(DeliveryReceipt {
            transport_id: Some(file_name),
            recipient: target_email.to_string(),
        })
    }
}
