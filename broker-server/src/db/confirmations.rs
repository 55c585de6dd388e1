//! Confirmation ledger queries.
//!
//! The ledger is append-only: rows are inserted by supplier commits and by
//! the admin's forward action; only the terminal `completed` status is ever
//! written afterward.

use shared::error::AppError;
use shared::models::{Confirmation, ConfirmationStatus, OrderKind, OrderRef};
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
pub struct ConfirmationRow {
    pub id: i64,
    pub submission_id: i64,
    pub order_kind: String,
    pub order_id: i64,
    pub order_no: Option<String>,
    pub supplier_id: i64,
    pub supplier_company: String,
    pub driver_name: String,
    pub driver_mobile: String,
    pub vehicle_number: String,
    pub vehicle_type: String,
    pub load_type: String,
    pub tonnage: f64,
    pub origin: String,
    pub destination: String,
    pub required_date: String,
    pub forwarded_to_buyer: bool,
    pub buyer_id: Option<i64>,
    pub status: String,
    pub created_at: i64,
}

impl ConfirmationRow {
    pub fn order_ref(&self) -> Result<OrderRef, AppError> {
        let kind: OrderKind = self
            .order_kind
            .parse()
            .map_err(|e: String| AppError::internal(format!("corrupt order kind: {e}")))?;
        Ok(OrderRef {
            kind,
            id: self.order_id,
        })
    }

    pub fn into_model(self) -> Result<Confirmation, AppError> {
        let order = self.order_ref()?;
        let status: ConfirmationStatus = self
            .status
            .parse()
            .map_err(|e: String| AppError::internal(format!("corrupt confirmation status: {e}")))?;
        Ok(Confirmation {
            id: self.id,
            submission_id: self.submission_id,
            order,
            order_no: self.order_no,
            supplier_id: self.supplier_id,
            supplier_company: self.supplier_company,
            driver_name: self.driver_name,
            driver_mobile: self.driver_mobile,
            vehicle_number: self.vehicle_number,
            vehicle_type: self.vehicle_type,
            load_type: self.load_type,
            tonnage: self.tonnage,
            origin: self.origin,
            destination: self.destination,
            required_date: self.required_date,
            forwarded_to_buyer: self.forwarded_to_buyer,
            buyer_id: self.buyer_id,
            status,
            created_at: self.created_at,
        })
    }
}

pub async fn by_id(pool: &SqlitePool, id: i64) -> Result<Option<ConfirmationRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM confirmations WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_order(
    pool: &SqlitePool,
    order: OrderRef,
) -> Result<Vec<ConfirmationRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM confirmations WHERE order_kind = ?1 AND order_id = ?2 ORDER BY created_at",
    )
    .bind(order.kind.as_str())
    .bind(order.id)
    .fetch_all(pool)
    .await
}

/// The buyer-visible entry for an order, if the admin has forwarded one.
pub async fn forwarded_for_order(
    pool: &SqlitePool,
    order: OrderRef,
) -> Result<Option<ConfirmationRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM confirmations
         WHERE order_kind = ?1 AND order_id = ?2 AND forwarded_to_buyer = 1",
    )
    .bind(order.kind.as_str())
    .bind(order.id)
    .fetch_optional(pool)
    .await
}

/// Whether a forwarded entry references the submission (blocks withdraw).
pub async fn forwarded_for_submission(
    pool: &SqlitePool,
    submission_id: i64,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM confirmations WHERE submission_id = ?1 AND forwarded_to_buyer = 1 LIMIT 1",
    )
    .bind(submission_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Whether any ledger entry still references the order (used by delete refusal).
pub async fn any_for_order(pool: &SqlitePool, order: OrderRef) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM confirmations WHERE order_kind = ?1 AND order_id = ?2 LIMIT 1",
    )
    .bind(order.kind.as_str())
    .bind(order.id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Entries a buyer is allowed to see: forwarded copies addressed to them.
pub async fn list_for_buyer(
    pool: &SqlitePool,
    buyer_id: i64,
) -> Result<Vec<ConfirmationRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM confirmations
         WHERE buyer_id = ?1 AND forwarded_to_buyer = 1 ORDER BY created_at DESC",
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await
}
