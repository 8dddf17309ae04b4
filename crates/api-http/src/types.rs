//! Request / response bodies

use playlist_export_core::domain::{DeadLetter, QueueDepth};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// POST /playlists/{playlistId}/exports
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[validate(email(message = "targetEmail must be a valid email"))]
    pub target_email: String,
}

/// First validation message, or a generic one
pub fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request payload".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBody<T> {
    pub status: String,
    pub data: T,
}

impl<T> DataBody<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDepthView {
    pub queue: String,
    pub ready: i64,
    pub in_flight: i64,
    pub dead_lettered: i64,
}

impl QueueDepthView {
    pub fn new(queue: &str, depth: QueueDepth) -> Self {
        Self {
            queue: queue.to_string(),
            ready: depth.ready,
            in_flight: depth.in_flight,
            dead_lettered: depth.dead_lettered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterView {
    pub id: String,
    pub body: String,
    pub attempts: i32,
    pub reason: String,
    pub failed_at: i64,
}

impl From<DeadLetter> for DeadLetterView {
    fn from(d: DeadLetter) -> Self {
        Self {
            id: d.id,
            body: d.body,
            attempts: d.attempts,
            reason: d.reason,
            failed_at: d.failed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLettersView {
    pub dead_letters: Vec<DeadLetterView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeadLetterQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthView {
    pub status: String,
    pub version: String,
}
