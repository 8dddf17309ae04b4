// Delivery Supervisor - turns processing outcomes into broker decisions

use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::domain::{Delivery, DiscardReason};
use crate::error::Result;
use crate::port::{DeliveryReceipt, MessageBroker};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Failure class of a processing attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Worth retrying: transport hiccup, store outage, timeout
    Transient(String),
    /// Will fail the same way again: rejected recipient, panic
    Permanent(String),
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transient(e) => write!(f, "transient: {}", e),
            FailureKind::Permanent(e) => write!(f, "permanent: {}", e),
        }
    }
}

/// Typed result of processing one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed(DeliveryReceipt),
    Discarded(DiscardReason),
    Failed(FailureKind),
}

/// What the supervisor did with the delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Requeued { delay_ms: i64 },
    DeadLettered { reason: String },
}

pub struct DeliverySupervisor {
    broker: Arc<dyn MessageBroker>,
    retry_policy: RetryPolicy,
}

impl DeliverySupervisor {
    pub fn new(broker: Arc<dyn MessageBroker>, retry_policy: RetryPolicy) -> Self {
        Self {
            broker,
            retry_policy,
        }
    }

    /// Acknowledge, requeue with backoff, or dead-letter `delivery`
    pub async fn settle(&self, delivery: &Delivery, outcome: ProcessOutcome) -> Result<Settlement> {
        match outcome {
            ProcessOutcome::Completed(receipt) => {
                self.broker.ack(delivery).await?;
                info!(
                    message_id = %delivery.id,
                    recipient = %receipt.recipient,
                    transport_id = ?receipt.transport_id,
                    attempt = %delivery.attempts,
                    "Export delivered"
                );
                Ok(Settlement::Acked)
            }
            ProcessOutcome::Discarded(DiscardReason::PlaylistNotFound(playlist_id)) => {
                self.broker.ack(delivery).await?;
                warn!(
                    message_id = %delivery.id,
                    playlist_id = %playlist_id,
                    "Export discarded: playlist no longer exists"
                );
                Ok(Settlement::Acked)
            }
            ProcessOutcome::Discarded(reason @ DiscardReason::MalformedMessage(_)) => {
                self.dead_letter(delivery, reason.to_string()).await
            }
            ProcessOutcome::Failed(FailureKind::Transient(e)) => {
                match self.retry_policy.should_retry(delivery) {
                    RetryDecision::Retry(delay_ms) => {
                        self.broker.nack(delivery, delay_ms, &e).await?;
                        warn!(
                            message_id = %delivery.id,
                            attempt = %delivery.attempts,
                            delay_ms = %delay_ms,
                            error = %e,
                            "Export failed, requeued for redelivery"
                        );
                        Ok(Settlement::Requeued { delay_ms })
                    }
                    RetryDecision::DeadLetter => {
                        self.dead_letter(delivery, format!("retries exhausted: {}", e))
                            .await
                    }
                }
            }
            ProcessOutcome::Failed(FailureKind::Permanent(e)) => {
                self.dead_letter(delivery, format!("permanent failure: {}", e))
                    .await
            }
        }
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: String) -> Result<Settlement> {
        self.broker.dead_letter(delivery, &reason).await?;
        error!(
            message_id = %delivery.id,
            attempts = %delivery.attempts,
            reason = %reason,
            "Export moved to dead-letter queue"
        );
        Ok(Settlement::DeadLettered { reason })
    }
}
