//! Supplier submission endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Confirmation, Driver, Role, Submission, SubmissionStatus, Vehicle};

use crate::auth::Identity;
use crate::db;
use crate::error::db_err;
use crate::state::AppState;
use crate::workflow::submissions;

use super::ApiResult;

#[derive(Debug, Serialize)]
pub struct FleetResponse {
    pub drivers: Vec<Driver>,
    pub vehicles: Vec<Vehicle>,
}

/// GET /api/supplier/fleet
///
/// The caller's own drivers and vehicles, for picking a commit pair.
pub async fn list_fleet(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<FleetResponse> {
    identity.require_role(Role::Supplier)?;

    let drivers = db::fleet::drivers_for_supplier(&state.pool, identity.subject_id)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|r| r.into_model())
        .collect();
    let vehicles = db::fleet::vehicles_for_supplier(&state.pool, identity.subject_id)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|r| r.into_model())
        .collect();
    Ok(Json(FleetResponse { drivers, vehicles }))
}

/// GET /api/supplier/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Submission>> {
    identity.require_role(Role::Supplier)?;

    let rows = db::submissions::list_for_supplier(&state.pool, identity.subject_id)
        .await
        .map_err(db_err)?;
    let items = rows
        .into_iter()
        .map(|r| r.into_model())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

/// POST /api/supplier/submissions/:id/viewed
pub async fn mark_viewed(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<Submission> {
    identity.require_role(Role::Supplier)?;

    let submission = submissions::mark_viewed(&state.pool, identity.subject_id, id).await?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize)]
pub struct RespondPayload {
    /// `responded` or `rejected`
    pub response: String,
}

/// POST /api/supplier/submissions/:id/respond
pub async fn respond(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(payload): Json<RespondPayload>,
) -> ApiResult<Submission> {
    identity.require_role(Role::Supplier)?;

    let response: SubmissionStatus = payload
        .response
        .parse()
        .map_err(|e: String| AppError::validation(e))?;
    let submission = submissions::respond(
        &state.pool,
        state.notifier.as_ref(),
        identity.subject_id,
        id,
        response,
    )
    .await?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize)]
pub struct CommitPayload {
    pub driver_id: i64,
    pub vehicle_id: i64,
}

/// POST /api/supplier/submissions/:id/commit
pub async fn commit(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(payload): Json<CommitPayload>,
) -> ApiResult<Confirmation> {
    identity.require_role(Role::Supplier)?;

    let confirmation = submissions::commit(
        &state.pool,
        state.notifier.as_ref(),
        identity.subject_id,
        id,
        payload.driver_id,
        payload.vehicle_id,
    )
    .await?;
    Ok(Json(confirmation))
}

/// POST /api/supplier/submissions/:id/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    identity.require_role(Role::Supplier)?;

    submissions::withdraw(&state.pool, state.notifier.as_ref(), identity.subject_id, id).await?;
    Ok(Json(serde_json::json!({ "withdrawn": true })))
}
