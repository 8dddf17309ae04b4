// Retry policy for failed export deliveries
use crate::application::consumer::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_RETRY_DELAY_MS,
    DEFAULT_RETRY_BASE_DELAY_MS,
};
use crate::domain::Delivery;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Redeliver after the given backoff delay in ms
    Retry(i64),
    /// Attempts exhausted; move to the dead-letter store
    DeadLetter,
}

/// Bounded exponential backoff
///
/// Determines if a delivery should be retried based on:
/// - Deliveries so far (the broker counts them)
/// - Maximum attempts allowed
/// - Backoff factor for exponential delay
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: i32,
    pub base_delay_ms: i64,
    pub backoff_factor: f64,
    pub max_delay_ms: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: i32, base_delay_ms: i64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            ..Self::default()
        }
    }

    /// Decide what happens to a delivery that failed transiently.
    ///
    /// Backoff formula:
    /// delay = base_delay * (backoff_factor ^ (attempts - 1)) * jitter, capped at max_delay
    pub fn should_retry(&self, delivery: &Delivery) -> RetryDecision {
        if delivery.attempts >= self.max_attempts {
            warn!(
                message_id = %delivery.id,
                attempts = %delivery.attempts,
                max_attempts = %self.max_attempts,
                "Max delivery attempts reached"
            );
            return RetryDecision::DeadLetter;
        }

        let exponent = (delivery.attempts - 1).max(0);
        let raw_delay_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);

        // ±10% jitter so a burst of failures does not retry in lockstep.
        // Seeded from the message ID: the same delivery always gets the same delay.
        let jitter_seed = delivery.id.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay_ms = ((raw_delay_ms * jitter_factor) as i64).min(self.max_delay_ms);

        info!(
            message_id = %delivery.id,
            attempt = %delivery.attempts,
            max_attempts = %self.max_attempts,
            delay_ms = %delay_ms,
            "Scheduling redelivery"
        );

        RetryDecision::Retry(delay_ms)
    }
}
