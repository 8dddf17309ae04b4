//! Health check

use axum::Json;

use crate::types::HealthView;

/// GET /health
pub async fn health() -> Json<HealthView> {
    Json(HealthView {
        status: "ok".to_string(),
        version: playlist_export_core::VERSION.to_string(),
    })
}
