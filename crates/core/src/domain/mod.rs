// Domain Layer - Pure business logic and entities

pub mod error;
pub mod export_job;
pub mod message;
pub mod playlist;
pub mod queue;
pub mod task;

// Re-exports
pub use error::DomainError;
pub use export_job::ExportJob;
pub use message::{DeadLetter, Delivery, MessageId, QueueDepth};
pub use playlist::{ExportPayload, Playlist, PlaylistHeader, SongSummary};
pub use queue::EXPORT_QUEUE;
pub use task::{DiscardReason, ExportTask, TaskState};
