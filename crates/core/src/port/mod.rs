// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod mailer;
pub mod message_broker;
pub mod playlist_repository;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use mailer::{DeliveryError, DeliveryReceipt, Mailer};
pub use message_broker::MessageBroker;
pub use playlist_repository::PlaylistRepository;
pub use time_provider::TimeProvider;
