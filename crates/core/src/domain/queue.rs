// Queue Domain Model

/// Queue the export producer publishes to and the consumer subscribes on.
///
/// Declared durable; redeclaring it is a no-op.
pub const EXPORT_QUEUE: &str = "export:playlist";
