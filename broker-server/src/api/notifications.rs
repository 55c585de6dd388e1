//! Inbox endpoints, shared by every role

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::Notification;

use crate::auth::Identity;
use crate::db;
use crate::error::db_err;
use crate::state::AppState;

use super::ApiResult;

#[derive(Debug, Deserialize, Default)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread: bool,
}

/// GET /api/notifications
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<InboxQuery>,
) -> ApiResult<Vec<Notification>> {
    let rows = db::notifications::list_for_recipient(
        &state.pool,
        identity.role,
        identity.subject_id,
        query.unread,
    )
    .await
    .map_err(db_err)?;
    let items = rows
        .into_iter()
        .map(|r| r.into_model())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let changed =
        db::notifications::mark_read(&state.pool, identity.role, identity.subject_id, id)
            .await
            .map_err(db_err)?;
    if !changed {
        return Err(AppError::new(ErrorCode::NotFound));
    }
    Ok(Json(serde_json::json!({ "read": true })))
}

/// POST /api/notifications/clear
pub async fn clear(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<serde_json::Value> {
    let removed = db::notifications::clear_all(&state.pool, identity.role, identity.subject_id)
        .await
        .map_err(db_err)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}
