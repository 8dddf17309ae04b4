// Mailer Port
// Abstraction over the email transport that delivers export payloads

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confirmation returned by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Transport-side message ID, when the transport reports one
    pub transport_id: Option<String>,
    pub recipient: String,
}

/// Delivery errors
///
/// Transient failures are worth retrying (network, timeout, throttling);
/// permanent ones will fail the same way every time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    #[error("Permanent delivery failure: {0}")]
    Permanent(String),
}

impl DeliveryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::Transient(_))
    }
}

/// Mailer trait
///
/// Implementations:
/// - HttpMailer: JSON mail API over HTTPS
/// - OutboxMailer: writes messages to a local directory
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `body` (the serialized export payload) to `target_email`
    async fn send(&self, target_email: &str, body: &str) -> Result<DeliveryReceipt, DeliveryError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock mailer behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Fail with a retryable error
        Transient(String),
        /// Fail with a non-retryable error
        Permanent(String),
        /// Sleep before succeeding (timeout testing)
        Hang(Duration),
        /// Panic with message (panic isolation testing)
        Panic(String),
    }

    /// A message the mock accepted
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMail {
        pub target_email: String,
        pub body: String,
    }

    /// Mock Mailer for testing
    ///
    /// Scripted behaviors are consumed first, then the default applies.
    pub struct MockMailer {
        default: MockBehavior,
        script: Mutex<VecDeque<MockBehavior>>,
        sent: Mutex<Vec<SentMail>>,
        call_count: Mutex<usize>,
    }

    impl MockMailer {
        pub fn new(default: MockBehavior) -> Self {
            Self {
                default,
                script: Mutex::new(VecDeque::new()),
                sent: Mutex::new(Vec::new()),
                call_count: Mutex::new(0),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        pub fn new_transient(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Transient(message.into()))
        }

        pub fn new_permanent(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Permanent(message.into()))
        }

        /// Queue behaviors for the next calls
        pub fn with_script(self, behaviors: impl IntoIterator<Item = MockBehavior>) -> Self {
            self.script.lock().unwrap().extend(behaviors);
            self
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        /// Successfully delivered messages, in order
        pub fn sent(&self) -> Vec<SentMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(
            &self,
            target_email: &str,
            body: &str,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            *self.call_count.lock().unwrap() += 1;

            let behavior = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default.clone());

            match behavior {
                MockBehavior::Success => {}
                MockBehavior::Transient(msg) => return Err(DeliveryError::Transient(msg)),
                MockBehavior::Permanent(msg) => return Err(DeliveryError::Permanent(msg)),
                MockBehavior::Hang(duration) => tokio::time::sleep(duration).await,
                MockBehavior::Panic(msg) => panic!("{}", msg),
            }

            self.sent.lock().unwrap().push(SentMail {
                target_email: target_email.to_string(),
                body: body.to_string(),
            });

            Ok(DeliveryReceipt {
                transport_id: Some(format!("mock-{}", self.call_count())),
                recipient: target_email.to_string(),
            })
        }
    }
}
