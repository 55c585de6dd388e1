//! Admin endpoints: manual orders, assignment, broadcast, forwarding,
//! completion and deletion.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use shared::models::{Confirmation, ManualOrder, Submission};
use validator::Validate;

use crate::auth::Identity;
use crate::db;
use crate::error::db_err;
use crate::state::AppState;
use crate::workflow::{forwarding, orders, submissions};

use super::orders::CreateOrderPayload;
use super::{parse_order_ref, ApiResult};

#[derive(Debug, Deserialize)]
pub struct AdminCreatePayload {
    #[serde(flatten)]
    pub order: CreateOrderPayload,
    pub assigned_supplier_id: Option<i64>,
}

/// POST /api/admin/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<AdminCreatePayload>,
) -> ApiResult<ManualOrder> {
    identity.require_admin()?;
    payload
        .order
        .validate()
        .map_err(|e| shared::error::AppError::validation(e.to_string()))?;

    let order = orders::admin_create(
        &state.pool,
        state.notifier.as_ref(),
        identity.subject_id,
        payload.order.into_draft(),
        payload.assigned_supplier_id,
    )
    .await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct SupplierIdsPayload {
    pub supplier_ids: Vec<i64>,
}

/// POST /api/admin/orders/:kind/:id/assign
pub async fn assign_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
    Json(payload): Json<SupplierIdsPayload>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    let offered = orders::assign(
        &state.pool,
        state.notifier.as_ref(),
        order,
        &payload.supplier_ids,
    )
    .await?;
    Ok(Json(serde_json::json!({ "offered": offered })))
}

/// POST /api/admin/orders/:kind/:id/broadcast
///
/// Widens the supplier pool on an order that already left `assigned`.
pub async fn broadcast_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
    Json(payload): Json<SupplierIdsPayload>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    let offered = submissions::broadcast(
        &state.pool,
        state.notifier.as_ref(),
        order,
        &payload.supplier_ids,
    )
    .await?;
    Ok(Json(serde_json::json!({ "offered": offered })))
}

/// POST /api/admin/orders/:kind/:id/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    orders::cancel(&state.pool, state.notifier.as_ref(), order).await?;
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

/// POST /api/admin/orders/:kind/:id/reject
pub async fn reject_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    orders::reject(&state.pool, state.notifier.as_ref(), order).await?;
    Ok(Json(serde_json::json!({ "rejected": true })))
}

/// POST /api/admin/orders/:kind/:id/complete
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    forwarding::complete(&state.pool, state.notifier.as_ref(), order).await?;
    Ok(Json(serde_json::json!({ "completed": true })))
}

/// DELETE /api/admin/orders/:kind/:id
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    orders::delete(&state.pool, order).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// GET /api/admin/orders/:kind/:id/submissions
pub async fn list_order_submissions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Vec<Submission>> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    let rows = db::submissions::list_for_order(&state.pool, order)
        .await
        .map_err(db_err)?;
    let items = rows
        .into_iter()
        .map(|r| r.into_model())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

/// GET /api/admin/orders/:kind/:id/confirmations
pub async fn list_order_confirmations(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Vec<Confirmation>> {
    identity.require_admin()?;
    let order = parse_order_ref(&kind, id)?;

    let rows = db::confirmations::list_for_order(&state.pool, order)
        .await
        .map_err(db_err)?;
    let items = rows
        .into_iter()
        .map(|r| r.into_model())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct ForwardPayload {
    pub buyer_id: i64,
}

/// POST /api/admin/confirmations/:id/forward
pub async fn forward_confirmation(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(payload): Json<ForwardPayload>,
) -> ApiResult<Confirmation> {
    identity.require_admin()?;

    let forwarded = forwarding::forward_to_buyer(
        &state.pool,
        state.notifier.as_ref(),
        id,
        payload.buyer_id,
    )
    .await?;
    Ok(Json(forwarded))
}
