//! Buyer order endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{BuyerOrder, Confirmation, Location, LoadDetails, Role};
use validator::Validate;

use crate::auth::Identity;
use crate::db;
use crate::error::db_err;
use crate::state::AppState;
use crate::workflow::orders::{self, OrderDraft};

use super::ApiResult;

#[derive(Debug, Deserialize, Validate)]
pub struct LocationPayload {
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub district: String,
    #[validate(length(min = 1))]
    pub place: String,
    pub sub_area: Option<String>,
}

impl From<LocationPayload> for Location {
    fn from(p: LocationPayload) -> Self {
        Location {
            state: p.state,
            district: p.district,
            place: p.place,
            sub_area: p.sub_area,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderPayload {
    #[validate(length(min = 1))]
    pub load_type: String,
    #[validate(range(min = 0.01))]
    pub tonnage: f64,
    #[validate(range(min = 1))]
    pub unit_count: Option<i32>,
    #[validate(nested)]
    pub origin: LocationPayload,
    #[validate(nested)]
    pub destination: LocationPayload,
    #[validate(length(min = 1))]
    pub required_date: String,
    pub instructions: Option<String>,
}

impl CreateOrderPayload {
    pub(crate) fn into_draft(self) -> OrderDraft {
        OrderDraft {
            load: LoadDetails {
                load_type: self.load_type,
                tonnage: self.tonnage,
                unit_count: self.unit_count,
            },
            origin: self.origin.into(),
            destination: self.destination.into(),
            required_date: self.required_date,
            instructions: self.instructions,
        }
    }
}

fn validated(payload: &CreateOrderPayload) -> Result<(), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))
}

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateOrderPayload>,
) -> ApiResult<BuyerOrder> {
    identity.require_role(Role::Buyer)?;
    validated(&payload)?;

    let order =
        orders::create_draft(&state.pool, identity.subject_id, payload.into_draft()).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/submit
pub async fn submit_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<BuyerOrder> {
    identity.require_role(Role::Buyer)?;

    let order = orders::submit(&state.pool, state.notifier.as_ref(), identity.subject_id, id)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<BuyerOrder>> {
    identity.require_role(Role::Buyer)?;

    let rows = db::orders::list_for_buyer(&state.pool, identity.subject_id)
        .await
        .map_err(db_err)?;
    let orders = rows
        .into_iter()
        .map(|r| r.into_model())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(orders))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<BuyerOrder> {
    identity.require_role(Role::Buyer)?;

    let Some(row) = db::orders::buyer_by_id(&state.pool, id).await.map_err(db_err)? else {
        return Err(AppError::new(ErrorCode::OrderNotFound));
    };
    let order = row.into_model()?;
    if order.buyer_id != identity.subject_id {
        return Err(AppError::forbidden("order belongs to another buyer"));
    }
    Ok(Json(order))
}

/// GET /api/confirmations
///
/// Forwarded entries addressed to the calling buyer.
pub async fn list_confirmations(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Confirmation>> {
    identity.require_role(Role::Buyer)?;

    let rows = db::confirmations::list_for_buyer(&state.pool, identity.subject_id)
        .await
        .map_err(db_err)?;
    let items = rows
        .into_iter()
        .map(|r| r.into_model())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}
