// SQLite MessageBroker Implementation
//
// Durable at-least-once queue. Leasing is a single atomic UPDATE ... RETURNING,
// so two consumer slots (or processes) never receive the same message.

use crate::error::map_broker_error;
use async_trait::async_trait;
use playlist_export_core::domain::{DeadLetter, Delivery, MessageId, QueueDepth};
use playlist_export_core::error::{AppError, Result};
use playlist_export_core::port::{IdProvider, MessageBroker, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

const STATE_READY: &str = "READY";
const STATE_IN_FLIGHT: &str = "IN_FLIGHT";

pub struct SqliteMessageBroker {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    // Publish counter for consumers in this process; other processes poll
    published: watch::Sender<u64>,
}

impl SqliteMessageBroker {
    pub fn new(
        pool: SqlitePool,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            pool,
            time_provider,
            id_provider,
            published: watch::channel(0).0,
        }
    }

    /// The lease behind `delivery` is gone: settled, recovered or re-leased
    fn lease_lost(delivery: &Delivery) -> AppError {
        AppError::NotFound(format!(
            "In-flight message {} (attempt {}) not found",
            delivery.id, delivery.attempts
        ))
    }
}

#[async_trait]
impl MessageBroker for SqliteMessageBroker {
    async fn declare_queue(&self, queue: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO queues (name, durable, created_at) VALUES (?, 1, ?)")
            .bind(queue)
            .bind(self.time_provider.now_millis())
            .execute(&self.pool)
            .await
            .map_err(map_broker_error)?;
        Ok(())
    }

    async fn publish(&self, queue: &str, body: &str) -> Result<MessageId> {
        let id = self.id_provider.generate_id();
        let now = self.time_provider.now_millis();

        // Publishing to an undeclared queue inserts nothing
        let result = sqlx::query(
            r#"
            INSERT INTO queue_messages (id, queue, body, state, attempts, enqueued_at, available_at)
            SELECT ?, name, ?, ?, 0, ?, ?
            FROM queues WHERE name = ?
            "#,
        )
        .bind(&id)
        .bind(body)
        .bind(STATE_READY)
        .bind(now)
        .bind(now)
        .bind(queue)
        .execute(&self.pool)
        .await
        .map_err(map_broker_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::BrokerUnavailable(format!(
                "Queue {} is not declared",
                queue
            )));
        }

        self.published.send_modify(|n| *n += 1);
        debug!(message_id = %id, queue = %queue, "Message stored");
        Ok(id)
    }

    async fn receive(&self, queue: &str, lease_ms: i64) -> Result<Option<Delivery>> {
        let now = self.time_provider.now_millis();

        let row = sqlx::query_as::<_, DeliveryRow>(
            r#"
            UPDATE queue_messages
            SET state = ?, attempts = attempts + 1, delivered_at = ?, lease_expires_at = ?
            WHERE seq = (
                SELECT seq FROM queue_messages
                WHERE queue = ? AND state = ? AND available_at <= ?
                ORDER BY seq ASC
                LIMIT 1
            )
            RETURNING id, queue, body, attempts, enqueued_at, delivered_at
            "#,
        )
        .bind(STATE_IN_FLIGHT)
        .bind(now)
        .bind(now + lease_ms)
        .bind(queue)
        .bind(STATE_READY)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_broker_error)?;

        Ok(row.map(DeliveryRow::into_delivery))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM queue_messages WHERE id = ? AND state = ? AND attempts = ?",
        )
        .bind(&delivery.id)
        .bind(STATE_IN_FLIGHT)
        .bind(delivery.attempts)
        .execute(&self.pool)
        .await
        .map_err(map_broker_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::lease_lost(delivery));
        }
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery, delay_ms: i64, reason: &str) -> Result<()> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query(
            r#"
            UPDATE queue_messages
            SET state = ?, available_at = ?, lease_expires_at = NULL, last_error = ?
            WHERE id = ? AND state = ? AND attempts = ?
            "#,
        )
        .bind(STATE_READY)
        .bind(now + delay_ms.max(0))
        .bind(reason)
        .bind(&delivery.id)
        .bind(STATE_IN_FLIGHT)
        .bind(delivery.attempts)
        .execute(&self.pool)
        .await
        .map_err(map_broker_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::lease_lost(delivery));
        }
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<()> {
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_broker_error)?;

        let removed = sqlx::query_as::<_, MessageRow>(
            r#"
            DELETE FROM queue_messages
            WHERE id = ? AND state = ? AND attempts = ?
            RETURNING id, queue, body, attempts
            "#,
        )
        .bind(&delivery.id)
        .bind(STATE_IN_FLIGHT)
        .bind(delivery.attempts)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_broker_error)?
        .ok_or_else(|| Self::lease_lost(delivery))?;

        sqlx::query(
            r#"
            INSERT INTO dead_letters (id, queue, body, attempts, reason, failed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&removed.id)
        .bind(&removed.queue)
        .bind(&removed.body)
        .bind(removed.attempts)
        .bind(reason)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_broker_error)?;

        tx.commit().await.map_err(map_broker_error)?;
        Ok(())
    }

    async fn depth(&self, queue: &str) -> Result<QueueDepth> {
        let (ready, in_flight): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN state = 'READY' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN state = 'IN_FLIGHT' THEN 1 ELSE 0 END), 0)
            FROM queue_messages
            WHERE queue = ?
            "#,
        )
        .bind(queue)
        .fetch_one(&self.pool)
        .await
        .map_err(map_broker_error)?;

        let dead_lettered: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dead_letters WHERE queue = ?")
            .bind(queue)
            .fetch_one(&self.pool)
            .await
            .map_err(map_broker_error)?;

        Ok(QueueDepth {
            ready,
            in_flight,
            dead_lettered,
        })
    }

    async fn recover_expired_leases(&self, queue: &str) -> Result<u64> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query(
            r#"
            UPDATE queue_messages
            SET state = ?, available_at = ?, lease_expires_at = NULL
            WHERE queue = ? AND state = ? AND lease_expires_at < ?
            "#,
        )
        .bind(STATE_READY)
        .bind(now)
        .bind(queue)
        .bind(STATE_IN_FLIGHT)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_broker_error)?;

        let recovered = result.rows_affected();
        if recovered > 0 {
            self.published.send_modify(|n| *n += 1);
        }
        Ok(recovered)
    }

    async fn list_dead_letters(&self, queue: &str, limit: i64) -> Result<Vec<DeadLetter>> {
        let rows = sqlx::query_as::<_, DeadLetterRow>(
            r#"
            SELECT id, queue, body, attempts, reason, failed_at
            FROM dead_letters
            WHERE queue = ?
            ORDER BY failed_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(queue)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(map_broker_error)?;

        Ok(rows.into_iter().map(DeadLetterRow::into_dead_letter).collect())
    }

    async fn requeue_dead_letter(&self, id: &MessageId) -> Result<()> {
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_broker_error)?;

        let dead = sqlx::query_as::<_, MessageRow>(
            "DELETE FROM dead_letters WHERE id = ? RETURNING id, queue, body, attempts",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_broker_error)?
        .ok_or_else(|| AppError::NotFound(format!("Dead letter {} not found", id)))?;

        sqlx::query("INSERT OR IGNORE INTO queues (name, durable, created_at) VALUES (?, 1, ?)")
            .bind(&dead.queue)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_broker_error)?;

        sqlx::query(
            r#"
            INSERT INTO queue_messages (id, queue, body, state, attempts, enqueued_at, available_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&dead.id)
        .bind(&dead.queue)
        .bind(&dead.body)
        .bind(STATE_READY)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_broker_error)?;

        tx.commit().await.map_err(map_broker_error)?;
        self.published.send_modify(|n| *n += 1);
        Ok(())
    }

    fn subscribe_publishes(&self) -> Option<watch::Receiver<u64>> {
        Some(self.published.subscribe())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    id: String,
    queue: String,
    body: String,
    attempts: i32,
    enqueued_at: i64,
    delivered_at: Option<i64>,
}

impl DeliveryRow {
    fn into_delivery(self) -> Delivery {
        Delivery {
            id: self.id,
            queue: self.queue,
            body: self.body,
            attempts: self.attempts,
            enqueued_at: self.enqueued_at,
            delivered_at: self.delivered_at.unwrap_or(self.enqueued_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: String,
    queue: String,
    body: String,
    attempts: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct DeadLetterRow {
    id: String,
    queue: String,
    body: String,
    attempts: i32,
    reason: String,
    failed_at: i64,
}

impl DeadLetterRow {
    fn into_dead_letter(self) -> DeadLetter {
        DeadLetter {
            id: self.id,
            queue: self.queue,
            body: self.body,
            attempts: self.attempts,
            reason: self.reason,
            failed_at: self.failed_at,
        }
    }
}
