// Lease recovery - returns deliveries orphaned by a crashed consumer
use crate::application::consumer::ShutdownToken;
use crate::error::Result;
use crate::port::MessageBroker;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Sweeps IN_FLIGHT messages whose lease expired back to READY.
///
/// The attempt count is kept, so a message that keeps killing its consumer
/// still ends up dead-lettered.
pub struct LeaseRecovery {
    broker: Arc<dyn MessageBroker>,
    queue: String,
}

impl LeaseRecovery {
    pub fn new(broker: Arc<dyn MessageBroker>, queue: impl Into<String>) -> Self {
        Self {
            broker,
            queue: queue.into(),
        }
    }

    /// One sweep; returns the number of recovered messages
    pub async fn recover_expired_leases(&self) -> Result<u64> {
        let recovered = self.broker.recover_expired_leases(&self.queue).await?;
        if recovered > 0 {
            info!(
                queue = %self.queue,
                recovered = recovered,
                "Recovered deliveries with expired leases"
            );
        }
        Ok(recovered)
    }

    /// Sweep immediately, then every `every` until shutdown
    pub async fn run(self, every: Duration, mut shutdown: ShutdownToken) {
        info!(
            queue = %self.queue,
            interval_secs = every.as_secs(),
            "Lease recovery started"
        );

        let mut tick = interval(every);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.recover_expired_leases().await {
                        error!(error = %e, "Lease recovery sweep failed");
                    }
                }
                _ = shutdown.wait() => break,
            }
        }

        info!(queue = %self.queue, "Lease recovery stopped");
    }
}
