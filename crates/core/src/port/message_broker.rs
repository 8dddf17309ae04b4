// Message Broker Port (Interface)
//
// Durable, at-least-once queue between the export producer and consumer.

use crate::domain::{DeadLetter, Delivery, MessageId, QueueDepth};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Broker interface
///
/// Lifecycle of a message: `publish` -> READY -> `receive` -> IN_FLIGHT ->
/// one of `ack` (deleted), `nack` (READY again after a delay) or
/// `dead_letter` (moved out of the queue).
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Declare a durable queue; declaring an existing queue is a no-op
    async fn declare_queue(&self, queue: &str) -> Result<()>;

    /// Publish a message body; returns once the broker has stored it
    async fn publish(&self, queue: &str, body: &str) -> Result<MessageId>;

    /// Lease the next ready message for `lease_ms`, FIFO by publish order
    async fn receive(&self, queue: &str, lease_ms: i64) -> Result<Option<Delivery>>;

    /// Remove an in-flight message for good
    ///
    /// Settlement is fenced on the lease: once `delivery`'s lease expired and
    /// the message was recovered or re-leased, `ack`, `nack` and `dead_letter`
    /// fail with `NotFound` and leave the message alone.
    async fn ack(&self, delivery: &Delivery) -> Result<()>;

    /// Return an in-flight message to the queue, deliverable after `delay_ms`
    async fn nack(&self, delivery: &Delivery, delay_ms: i64, reason: &str) -> Result<()>;

    /// Move an in-flight message to the dead-letter store
    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<()>;

    /// Ready / in-flight / dead-lettered counts
    async fn depth(&self, queue: &str) -> Result<QueueDepth>;

    /// Return in-flight messages whose lease expired to READY
    async fn recover_expired_leases(&self, queue: &str) -> Result<u64>;

    /// Newest dead letters first
    async fn list_dead_letters(&self, queue: &str, limit: i64) -> Result<Vec<DeadLetter>>;

    /// Put a dead letter back on its queue with a fresh attempt count
    async fn requeue_dead_letter(&self, id: &MessageId) -> Result<()>;

    /// Counter bumped whenever a message becomes ready in this process.
    ///
    /// Subscribe before receiving so a publish that lands between an empty
    /// receive and the wait still wakes the caller. `None` means poll only.
    fn subscribe_publishes(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::time_provider::SystemTimeProvider;
    use crate::port::TimeProvider;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct StoredMessage {
        seq: u64,
        delivery: Delivery,
        available_at: i64,
        lease_expires_at: Option<i64>,
    }

    #[derive(Default)]
    struct State {
        queues: HashSet<String>,
        messages: HashMap<MessageId, StoredMessage>,
        dead_letters: Vec<DeadLetter>,
    }

    /// In-memory broker with the same semantics as the durable adapter
    pub struct InMemoryBroker {
        state: Mutex<State>,
        seq: AtomicU64,
        time_provider: Arc<dyn TimeProvider>,
        published: watch::Sender<u64>,
        unavailable: AtomicBool,
    }

    impl Default for InMemoryBroker {
        fn default() -> Self {
            Self::new(Arc::new(SystemTimeProvider))
        }
    }

    impl InMemoryBroker {
        pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
            Self {
                state: Mutex::new(State::default()),
                seq: AtomicU64::new(0),
                time_provider,
                published: watch::channel(0).0,
                unavailable: AtomicBool::new(false),
            }
        }

        /// Simulate a broker outage (publishes and receives fail)
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Bodies of every message still owned by the queue, in publish order
        pub fn pending_bodies(&self, queue: &str) -> Vec<String> {
            let state = self.state.lock().unwrap();
            let mut messages: Vec<&StoredMessage> = state
                .messages
                .values()
                .filter(|m| m.delivery.queue == queue)
                .collect();
            messages.sort_by_key(|m| m.seq);
            messages.iter().map(|m| m.delivery.body.clone()).collect()
        }

        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AppError::BrokerUnavailable(
                    "in-memory broker marked unavailable".to_string(),
                ));
            }
            Ok(())
        }

        fn take_in_flight(state: &mut State, delivery: &Delivery) -> Result<StoredMessage> {
            let leased = matches!(
                state.messages.get(&delivery.id),
                Some(m) if m.lease_expires_at.is_some() && m.delivery.attempts == delivery.attempts
            );
            let taken = if leased {
                state.messages.remove(&delivery.id)
            } else {
                None
            };
            taken.ok_or_else(|| {
                AppError::NotFound(format!(
                    "In-flight message {} (attempt {}) not found",
                    delivery.id, delivery.attempts
                ))
            })
        }
    }

    #[async_trait]
    impl MessageBroker for InMemoryBroker {
        async fn declare_queue(&self, queue: &str) -> Result<()> {
            self.check_available()?;
            self.state.lock().unwrap().queues.insert(queue.to_string());
            Ok(())
        }

        async fn publish(&self, queue: &str, body: &str) -> Result<MessageId> {
            self.check_available()?;
            let now = self.time_provider.now_millis();
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            let id = format!("mem-{}", seq);

            {
                let mut state = self.state.lock().unwrap();
                if !state.queues.contains(queue) {
                    return Err(AppError::BrokerUnavailable(format!(
                        "Queue {} is not declared",
                        queue
                    )));
                }
                state.messages.insert(
                    id.clone(),
                    StoredMessage {
                        seq,
                        delivery: Delivery {
                            id: id.clone(),
                            queue: queue.to_string(),
                            body: body.to_string(),
                            attempts: 0,
                            enqueued_at: now,
                            delivered_at: 0,
                        },
                        available_at: now,
                        lease_expires_at: None,
                    },
                );
            }

            self.published.send_modify(|n| *n += 1);
            Ok(id)
        }

        async fn receive(&self, queue: &str, lease_ms: i64) -> Result<Option<Delivery>> {
            self.check_available()?;
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();

            let next = state
                .messages
                .values_mut()
                .filter(|m| {
                    m.delivery.queue == queue
                        && m.lease_expires_at.is_none()
                        && m.available_at <= now
                })
                .min_by_key(|m| m.seq);

            Ok(next.map(|m| {
                m.delivery.attempts += 1;
                m.delivery.delivered_at = now;
                m.lease_expires_at = Some(now + lease_ms);
                m.delivery.clone()
            }))
        }

        async fn ack(&self, delivery: &Delivery) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            Self::take_in_flight(&mut state, delivery)?;
            Ok(())
        }

        async fn nack(&self, delivery: &Delivery, delay_ms: i64, _reason: &str) -> Result<()> {
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();
            let mut message = Self::take_in_flight(&mut state, delivery)?;
            message.lease_expires_at = None;
            message.available_at = now + delay_ms;
            state.messages.insert(delivery.id.clone(), message);
            Ok(())
        }

        async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<()> {
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();
            let message = Self::take_in_flight(&mut state, delivery)?;
            state.dead_letters.push(DeadLetter {
                id: message.delivery.id,
                queue: message.delivery.queue,
                body: message.delivery.body,
                attempts: message.delivery.attempts,
                reason: reason.to_string(),
                failed_at: now,
            });
            Ok(())
        }

        async fn depth(&self, queue: &str) -> Result<QueueDepth> {
            let state = self.state.lock().unwrap();
            let mut depth = QueueDepth::default();
            for m in state.messages.values().filter(|m| m.delivery.queue == queue) {
                if m.lease_expires_at.is_some() {
                    depth.in_flight += 1;
                } else {
                    depth.ready += 1;
                }
            }
            depth.dead_lettered =
                state.dead_letters.iter().filter(|d| d.queue == queue).count() as i64;
            Ok(depth)
        }

        async fn recover_expired_leases(&self, queue: &str) -> Result<u64> {
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();
            let mut recovered = 0;
            for m in state.messages.values_mut().filter(|m| m.delivery.queue == queue) {
                if matches!(m.lease_expires_at, Some(lease) if lease < now) {
                    m.lease_expires_at = None;
                    m.available_at = now;
                    recovered += 1;
                }
            }
            Ok(recovered)
        }

        async fn list_dead_letters(&self, queue: &str, limit: i64) -> Result<Vec<DeadLetter>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .dead_letters
                .iter()
                .rev()
                .filter(|d| d.queue == queue)
                .take(limit.max(0) as usize)
                .cloned()
                .collect())
        }

        async fn requeue_dead_letter(&self, id: &MessageId) -> Result<()> {
            let now = self.time_provider.now_millis();
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            {
                let mut state = self.state.lock().unwrap();
                let pos = state
                    .dead_letters
                    .iter()
                    .position(|d| &d.id == id)
                    .ok_or_else(|| AppError::NotFound(format!("Dead letter {} not found", id)))?;
                let dead = state.dead_letters.remove(pos);
                state.messages.insert(
                    dead.id.clone(),
                    StoredMessage {
                        seq,
                        delivery: Delivery {
                            id: dead.id,
                            queue: dead.queue,
                            body: dead.body,
                            attempts: 0,
                            enqueued_at: now,
                            delivered_at: 0,
                        },
                        available_at: now,
                        lease_expires_at: None,
                    },
                );
            }
            self.published.send_modify(|n| *n += 1);
            Ok(())
        }

        fn subscribe_publishes(&self) -> Option<watch::Receiver<u64>> {
            Some(self.published.subscribe())
        }
    }
}
