//! HTTP Error Mapping
//!
//! Maps application errors onto status codes and the `{status, message}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use playlist_export_core::error::AppError;
use serde::{Deserialize, Serialize};

/// Message returned for every 500; details stay in the logs
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Response envelope shared by success and failure bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
    pub message: String,
}

impl StatusBody {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            message: message.into(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: "error".to_string(),
            message: INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

/// `AppError` as an HTTP response (newtype: both traits are foreign here)
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Invariant(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self.0 {
            AppError::NotFound(msg)
            | AppError::Authorization(msg)
            | AppError::Invariant(msg)
            | AppError::Authentication(msg) => StatusBody::fail(msg.clone()),
            other => {
                tracing::error!(error = %other, "Internal server error");
                StatusBody::error()
            }
        };

        (status, Json(body)).into_response()
    }
}
