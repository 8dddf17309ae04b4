// Playlist Export Infrastructure - Mail Adapters
// Implements: Mailer (HTTP mail API, local outbox)

pub mod http_mailer;
pub mod message;
pub mod outbox_mailer;

pub use http_mailer::{HttpMailer, HttpMailerConfig};
pub use message::{validate_address, Attachment, MailMessage};
pub use outbox_mailer::OutboxMailer;
