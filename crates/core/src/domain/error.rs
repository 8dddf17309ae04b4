// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid export task transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Malformed export job: {0}")]
    MalformedJob(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
