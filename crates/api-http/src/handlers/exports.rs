//! Export requests

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use playlist_export_core::error::AppError;
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, StatusBody};
use crate::extractors::AuthUser;
use crate::state::AppState;
use crate::types::{validation_message, ExportRequest};

pub const EXPORT_QUEUED_MESSAGE: &str = "Your export request has been queued";

/// POST /playlists/{playlistId}/exports
///
/// Order: authenticate, validate the body, check ownership, publish.
pub async fn export_playlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(playlist_id): Path<String>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusBody>), ApiError> {
    let Json(request) = payload.map_err(|e| AppError::Invariant(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::Invariant(validation_message(&e)))?;

    let message_id = state
        .export_service
        .request_export(&playlist_id, &user.user_id, &request.target_email)
        .await?;

    info!(
        message_id = %message_id,
        playlist_id = %playlist_id,
        user_id = %user.user_id,
        "Export request queued"
    );

    Ok((
        StatusCode::CREATED,
        Json(StatusBody::success(EXPORT_QUEUED_MESSAGE)),
    ))
}
