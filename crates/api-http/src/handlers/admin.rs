//! Admin queue endpoints (require the X-Admin-Key header)

use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::info;

use crate::error::{ApiError, StatusBody};
use crate::extractors::AdminKey;
use crate::state::AppState;
use crate::types::{DataBody, DeadLetterQuery, DeadLetterView, DeadLettersView, QueueDepthView};

const DEFAULT_DEAD_LETTER_LIMIT: i64 = 50;
const MAX_DEAD_LETTER_LIMIT: i64 = 500;

/// GET /exports/queue
pub async fn queue_depth(
    State(state): State<AppState>,
    _admin: AdminKey,
) -> Result<Json<DataBody<QueueDepthView>>, ApiError> {
    let depth = state.broker.depth(&state.queue).await?;
    Ok(Json(DataBody::success(QueueDepthView::new(&state.queue, depth))))
}

/// GET /exports/dead-letters?limit=N
pub async fn list_dead_letters(
    State(state): State<AppState>,
    _admin: AdminKey,
    Query(query): Query<DeadLetterQuery>,
) -> Result<Json<DataBody<DeadLettersView>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_DEAD_LETTER_LIMIT)
        .clamp(1, MAX_DEAD_LETTER_LIMIT);

    let dead_letters = state.broker.list_dead_letters(&state.queue, limit).await?;
    Ok(Json(DataBody::success(DeadLettersView {
        dead_letters: dead_letters.into_iter().map(DeadLetterView::from).collect(),
    })))
}

/// POST /exports/dead-letters/{id}/requeue
pub async fn requeue_dead_letter(
    State(state): State<AppState>,
    _admin: AdminKey,
    Path(id): Path<String>,
) -> Result<Json<StatusBody>, ApiError> {
    state.broker.requeue_dead_letter(&id).await?;
    info!(message_id = %id, "Dead letter requeued by operator");
    Ok(Json(StatusBody::success("Dead letter requeued")))
}
