//! Order queries: buyer and manual order tables.
//!
//! The two tables share a shape; [`OrderHead`] is the kind-agnostic view the
//! workflow engine operates on. Guarded status updates live inside workflow
//! transactions; this module holds row types and reusable reads.

use shared::error::AppError;
use shared::models::{
    BuyerOrder, Location, LoadDetails, ManualOrder, OrderKind, OrderRef, OrderStatus,
};
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
pub struct BuyerOrderRow {
    pub id: i64,
    pub order_no: Option<String>,
    pub buyer_id: i64,
    pub load_type: String,
    pub tonnage: f64,
    pub unit_count: Option<i32>,
    pub origin_state: String,
    pub origin_district: String,
    pub origin_place: String,
    pub origin_sub_area: Option<String>,
    pub dest_state: String,
    pub dest_district: String,
    pub dest_place: String,
    pub dest_sub_area: Option<String>,
    pub required_date: String,
    pub instructions: Option<String>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ManualOrderRow {
    pub id: i64,
    pub order_no: Option<String>,
    pub created_by: i64,
    pub assigned_supplier_id: Option<i64>,
    pub load_type: String,
    pub tonnage: f64,
    pub unit_count: Option<i32>,
    pub origin_state: String,
    pub origin_district: String,
    pub origin_place: String,
    pub origin_sub_area: Option<String>,
    pub dest_state: String,
    pub dest_district: String,
    pub dest_place: String,
    pub dest_sub_area: Option<String>,
    pub required_date: String,
    pub instructions: Option<String>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.parse()
        .map_err(|e: String| AppError::internal(format!("corrupt order status: {e}")))
}

impl BuyerOrderRow {
    pub fn into_model(self) -> Result<BuyerOrder, AppError> {
        let status = parse_status(&self.status)?;
        Ok(BuyerOrder {
            id: self.id,
            order_no: self.order_no,
            buyer_id: self.buyer_id,
            load: LoadDetails {
                load_type: self.load_type,
                tonnage: self.tonnage,
                unit_count: self.unit_count,
            },
            origin: Location {
                state: self.origin_state,
                district: self.origin_district,
                place: self.origin_place,
                sub_area: self.origin_sub_area,
            },
            destination: Location {
                state: self.dest_state,
                district: self.dest_district,
                place: self.dest_place,
                sub_area: self.dest_sub_area,
            },
            required_date: self.required_date,
            instructions: self.instructions,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ManualOrderRow {
    pub fn into_model(self) -> Result<ManualOrder, AppError> {
        let status = parse_status(&self.status)?;
        Ok(ManualOrder {
            id: self.id,
            order_no: self.order_no,
            created_by: self.created_by,
            assigned_supplier_id: self.assigned_supplier_id,
            load: LoadDetails {
                load_type: self.load_type,
                tonnage: self.tonnage,
                unit_count: self.unit_count,
            },
            origin: Location {
                state: self.origin_state,
                district: self.origin_district,
                place: self.origin_place,
                sub_area: self.origin_sub_area,
            },
            destination: Location {
                state: self.dest_state,
                district: self.dest_district,
                place: self.dest_place,
                sub_area: self.dest_sub_area,
            },
            required_date: self.required_date,
            instructions: self.instructions,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Kind-agnostic view of an order used by broadcast, forwarding and
/// completion. Route fields are pre-rendered for ledger snapshots.
#[derive(Debug, Clone)]
pub struct OrderHead {
    pub order: OrderRef,
    pub order_no: Option<String>,
    pub status: OrderStatus,
    /// Present only for buyer orders
    pub buyer_id: Option<i64>,
    pub load_type: String,
    pub tonnage: f64,
    pub origin: String,
    pub destination: String,
    pub required_date: String,
}

pub async fn buyer_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<BuyerOrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM buyer_orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn manual_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<ManualOrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM manual_orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_buyer(
    pool: &SqlitePool,
    buyer_id: i64,
) -> Result<Vec<BuyerOrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM buyer_orders WHERE buyer_id = ?1 ORDER BY created_at DESC")
        .bind(buyer_id)
        .fetch_all(pool)
        .await
}

/// Load the kind-agnostic head, or `None` if the order does not exist.
pub async fn head(pool: &SqlitePool, order: OrderRef) -> Result<Option<OrderHead>, AppError> {
    let head = match order.kind {
        OrderKind::Buyer => {
            let Some(row) = buyer_by_id(pool, order.id)
                .await
                .map_err(|e| AppError::database(e.to_string()))?
            else {
                return Ok(None);
            };
            let model = row.into_model()?;
            OrderHead {
                order,
                order_no: model.order_no,
                status: model.status,
                buyer_id: Some(model.buyer_id),
                load_type: model.load.load_type,
                tonnage: model.load.tonnage,
                origin: model.origin.summary(),
                destination: model.destination.summary(),
                required_date: model.required_date,
            }
        }
        OrderKind::Manual => {
            let Some(row) = manual_by_id(pool, order.id)
                .await
                .map_err(|e| AppError::database(e.to_string()))?
            else {
                return Ok(None);
            };
            let model = row.into_model()?;
            OrderHead {
                order,
                order_no: model.order_no,
                status: model.status,
                buyer_id: None,
                load_type: model.load.load_type,
                tonnage: model.load.tonnage,
                origin: model.origin.summary(),
                destination: model.destination.summary(),
                required_date: model.required_date,
            }
        }
    };
    Ok(Some(head))
}

/// Guarded status update; the WHERE clause re-checks the expected current
/// status so a concurrent transition shows up as zero rows changed.
pub fn status_update_sql(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Buyer => {
            "UPDATE buyer_orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4"
        }
        OrderKind::Manual => {
            "UPDATE manual_orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4"
        }
    }
}

pub fn delete_sql(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Buyer => "DELETE FROM buyer_orders WHERE id = ?1",
        OrderKind::Manual => "DELETE FROM manual_orders WHERE id = ?1",
    }
}
