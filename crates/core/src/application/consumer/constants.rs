// Consumer constants (no magic values)
use std::time::Duration;

/// Idle wait when the queue is empty; publish notifications cut it short
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(500);

/// Sleep after a broker error before the slot tries again
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Deliveries before a transiently failing message is dead-lettered
pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Default retry base delay (1000ms = 1s)
pub const DEFAULT_RETRY_BASE_DELAY_MS: i64 = 1000;

pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Upper bound on a single backoff (5 minutes)
pub const DEFAULT_MAX_RETRY_DELAY_MS: i64 = 5 * 60 * 1000;

/// Per-delivery processing budget (aggregation + mail)
pub const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(60);

/// Delivery lease (5 minutes); must outlast the processing timeout
pub const DEFAULT_LEASE_MS: i64 = 5 * 60 * 1000;

/// How often expired leases are swept back to READY
pub const DEFAULT_RECOVERY_INTERVAL: Duration = Duration::from_secs(30);
