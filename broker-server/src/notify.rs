//! Notification fan-out
//!
//! The workflow engine talks to an injected [`NotificationSink`] so tests can
//! substitute a recording fake. Delivery is best-effort: a sink failure is
//! logged and swallowed, never surfaced as the triggering operation's
//! failure.

use async_trait::async_trait;
use shared::models::{NotificationRequest, NotifyPriority, OrderRef, Role};
use sqlx::SqlitePool;

use crate::db;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Side-channel accepting role-scoped inbox writes.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, req: NotificationRequest) -> Result<(), BoxError>;
}

/// Default sink: writes inbox rows to the notifications table.
pub struct DbNotificationSink {
    pool: SqlitePool,
}

impl DbNotificationSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for DbNotificationSink {
    async fn deliver(&self, req: NotificationRequest) -> Result<(), BoxError> {
        db::notifications::insert(&self.pool, &req).await?;
        Ok(())
    }
}

/// Fire-and-forget delivery. Runs after the workflow transaction committed.
pub async fn fan_out(sink: &dyn NotificationSink, req: NotificationRequest) {
    let kind = req.kind.clone();
    if let Err(e) = sink.deliver(req).await {
        tracing::warn!(kind = %kind, error = %e, "notification fan-out failed");
    }
}

/// Recipient id for the shared admin inbox. Admin notifications are not
/// addressed to one operator.
pub const ADMIN_INBOX: i64 = 0;

/// Shorthand constructor used by the workflow modules.
pub fn request(
    role: Role,
    recipient_id: i64,
    kind: &str,
    title: impl Into<String>,
    message: impl Into<String>,
    priority: NotifyPriority,
    order: Option<OrderRef>,
) -> NotificationRequest {
    NotificationRequest {
        role,
        recipient_id,
        kind: kind.to_string(),
        title: title.into(),
        message: message.into(),
        category: "order".to_string(),
        priority,
        order_kind: order.map(|o| o.kind),
        order_id: order.map(|o| o.id),
    }
}
