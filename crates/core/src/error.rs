// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// The first five variants are the export pipeline's taxonomy; the HTTP
/// layer maps them onto 404 / 403 / 400 / 500 responses.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Invariant error: {0}")]
    Invariant(String),

    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("Delivery error: {0}")]
    Delivery(#[from] crate::port::DeliveryError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures the caller caused (4xx class)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::Authorization(_)
                | AppError::Invariant(_)
                | AppError::Authentication(_)
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error and reqwest::Error conversions live in the infra crates
// (orphan rule), mapped explicitly to Database / BrokerUnavailable / Delivery.
