// HTTP mail API transport
use async_trait::async_trait;
use playlist_export_core::error::AppError;
use playlist_export_core::port::{DeliveryError, DeliveryReceipt, Mailer};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::message::{validate_address, MailMessage};

#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    /// Full URL of the send endpoint
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub timeout: Duration,
}

/// Posts export mails as JSON to a transactional mail API
pub struct HttpMailer {
    client: reqwest::Client,
    config: HttpMailerConfig,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

impl HttpMailer {
    pub fn new(config: HttpMailerConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, target_email: &str, body: &str) -> Result<DeliveryReceipt, DeliveryError> {
        validate_address(target_email)?;
        let message = MailMessage::export(&self.config.from, target_email, body);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        // An unreadable body only loses detail, not the outcome
        let text = response.text().await.unwrap_or_default();

        if let Some(err) = classify_status(status, &text) {
            warn!(
                status = status.as_u16(),
                retryable = err.is_retryable(),
                "Mail API rejected export"
            );
            return Err(err);
        }

        let transport_id = serde_json::from_str::<SendResponse>(&text)
            .ok()
            .and_then(|r| r.id);
        debug!(recipient = %target_email, transport_id = ?transport_id, "Mail API accepted export");

        Ok(DeliveryReceipt {
            transport_id,
            recipient: target_email.to_string(),
        })
    }
}

/// Map a non-success status to a delivery error; `None` for 2xx.
///
/// 408, 429 and 5xx are worth retrying; any other 4xx is not.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> Option<DeliveryError> {
    if status.is_success() {
        return None;
    }

    let detail = format!("mail API responded {}: {}", status, body.trim());
    let retryable = status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS;

    Some(if retryable {
        DeliveryError::Transient(detail)
    } else {
        DeliveryError::Permanent(detail)
    })
}

fn classify_transport_error(err: reqwest::Error) -> DeliveryError {
    if err.is_builder() {
        DeliveryError::Permanent(format!("invalid mail API request: {}", err))
    } else if err.is_timeout() {
        DeliveryError::Transient(format!("mail API timed out: {}", err))
    } else {
        DeliveryError::Transient(format!("mail API unreachable: {}", err))
    }
}
