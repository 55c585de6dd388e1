//! Notification inbox queries.
//!
//! Read/unread and clear-all operate on one recipient's inbox only and sit
//! outside the order state machine.

use shared::error::AppError;
use shared::models::{Notification, NotifyPriority, OrderKind, Role};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub role: String,
    pub recipient_id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub category: String,
    pub priority: String,
    pub read: bool,
    pub order_kind: Option<String>,
    pub order_id: Option<i64>,
    pub created_at: i64,
}

impl NotificationRow {
    pub fn into_model(self) -> Result<Notification, AppError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| AppError::internal(format!("corrupt role: {e}")))?;
        let priority: NotifyPriority = self
            .priority
            .parse()
            .map_err(|e: String| AppError::internal(format!("corrupt priority: {e}")))?;
        let order_kind = match self.order_kind.as_deref() {
            Some(raw) => Some(
                raw.parse::<OrderKind>()
                    .map_err(|e| AppError::internal(format!("corrupt order kind: {e}")))?,
            ),
            None => None,
        };
        Ok(Notification {
            id: self.id,
            role,
            recipient_id: self.recipient_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            category: self.category,
            priority,
            read: self.read,
            order_kind,
            order_id: self.order_id,
            created_at: self.created_at,
        })
    }
}

pub async fn insert(
    pool: &SqlitePool,
    req: &shared::models::NotificationRequest,
) -> Result<i64, sqlx::Error> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO notifications
            (id, role, recipient_id, kind, title, message, category, priority,
             read, order_kind, order_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?11)",
    )
    .bind(id)
    .bind(req.role.as_str())
    .bind(req.recipient_id)
    .bind(&req.kind)
    .bind(&req.title)
    .bind(&req.message)
    .bind(&req.category)
    .bind(req.priority.as_str())
    .bind(req.order_kind.map(|k| k.as_str()))
    .bind(req.order_id)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn list_for_recipient(
    pool: &SqlitePool,
    role: Role,
    recipient_id: i64,
    unread_only: bool,
) -> Result<Vec<NotificationRow>, sqlx::Error> {
    if unread_only {
        sqlx::query_as(
            "SELECT * FROM notifications
             WHERE role = ?1 AND recipient_id = ?2 AND read = 0
             ORDER BY created_at DESC",
        )
        .bind(role.as_str())
        .bind(recipient_id)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as(
            "SELECT * FROM notifications
             WHERE role = ?1 AND recipient_id = ?2
             ORDER BY created_at DESC",
        )
        .bind(role.as_str())
        .bind(recipient_id)
        .fetch_all(pool)
        .await
    }
}

/// Mark one entry read; scoped to the recipient so a caller cannot touch
/// another inbox. Returns whether a row changed.
pub async fn mark_read(
    pool: &SqlitePool,
    role: Role,
    recipient_id: i64,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET read = 1 WHERE id = ?1 AND role = ?2 AND recipient_id = ?3",
    )
    .bind(id)
    .bind(role.as_str())
    .bind(recipient_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Clear the recipient's inbox. Returns the number of removed entries.
pub async fn clear_all(
    pool: &SqlitePool,
    role: Role,
    recipient_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE role = ?1 AND recipient_id = ?2")
        .bind(role.as_str())
        .bind(recipient_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
