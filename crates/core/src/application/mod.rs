// Application Layer - Use Cases and Business Logic

pub mod aggregator;
pub mod consumer;
pub mod export_service;
pub mod ownership;
pub mod producer;
pub mod recovery;
pub mod retry;
pub mod supervisor;

// Re-exports
pub use aggregator::PlaylistAggregator;
pub use consumer::{shutdown_channel, AckMode, ConsumerConfig, ExportConsumer, ShutdownSender, ShutdownToken};
pub use export_service::ExportService;
pub use ownership::OwnershipGate;
pub use producer::ExportProducer;
pub use recovery::LeaseRecovery;
pub use retry::{RetryDecision, RetryPolicy};
pub use supervisor::{DeliverySupervisor, FailureKind, ProcessOutcome, Settlement};
