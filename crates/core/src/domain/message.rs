// Broker Message Model

use serde::{Deserialize, Serialize};

/// Broker-assigned message ID (UUID v4)
pub type MessageId = String;

/// A message leased to one consumer slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: MessageId,
    pub queue: String,
    pub body: String,
    /// Deliveries so far, including this one (first delivery = 1)
    pub attempts: i32,
    pub enqueued_at: i64, // epoch ms
    pub delivered_at: i64,
}

/// Message that will not be delivered again without operator action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub id: MessageId,
    pub queue: String,
    pub body: String,
    pub attempts: i32,
    pub reason: String,
    pub failed_at: i64,
}

/// Per-queue message counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    pub ready: i64,
    pub in_flight: i64,
    pub dead_lettered: i64,
}

impl QueueDepth {
    /// Messages still owned by the queue (ready + in flight)
    pub fn pending(&self) -> i64 {
        self.ready + self.in_flight
    }
}
