//! Submission queries.

use shared::error::AppError;
use shared::models::{OrderKind, OrderRef, Submission, SubmissionStatus};
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub order_kind: String,
    pub order_id: i64,
    pub supplier_id: i64,
    pub status: String,
    pub driver_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub created_at: i64,
    pub responded_at: Option<i64>,
}

impl SubmissionRow {
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

    pub fn parsed_status(&self) -> Result<SubmissionStatus, AppError> {
        self.status
            .parse()
            .map_err(|e: String| AppError::internal(format!("corrupt submission status: {e}")))
    }

    pub fn into_model(self) -> Result<Submission, AppError> {
        let order = self.order_ref()?;
        let status = self.parsed_status()?;
        Ok(Submission {
            id: self.id,
            order,
            supplier_id: self.supplier_id,
            status,
            driver_id: self.driver_id,
            vehicle_id: self.vehicle_id,
            created_at: self.created_at,
            responded_at: self.responded_at,
        })
    }
}

pub async fn by_id(pool: &SqlitePool, id: i64) -> Result<Option<SubmissionRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM submissions WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_supplier(
    pool: &SqlitePool,
    supplier_id: i64,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM submissions WHERE supplier_id = ?1 ORDER BY created_at DESC")
        .bind(supplier_id)
        .fetch_all(pool)
        .await
}

pub async fn list_for_order(
    pool: &SqlitePool,
    order: OrderRef,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM submissions WHERE order_kind = ?1 AND order_id = ?2 ORDER BY created_at",
    )
    .bind(order.kind.as_str())
    .bind(order.id)
    .fetch_all(pool)
    .await
}
