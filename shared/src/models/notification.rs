//! Notification model
//!
//! Role-scoped inbox entries written as a side effect of workflow
//! transitions. Best-effort: never required for workflow correctness.

use super::order::OrderKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role; also scopes notification inboxes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supplier,
    Buyer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supplier => "supplier",
            Self::Buyer => "buyer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "supplier" => Ok(Self::Supplier),
            "buyer" => Ok(Self::Buyer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery priority hint for inbox rendering
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl NotifyPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl FromStr for NotifyPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Stored inbox entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub role: Role,
    pub recipient_id: i64,
    /// Machine-readable kind, e.g. `order_submitted`, `confirmation_forwarded`
    pub kind: String,
    pub title: String,
    pub message: String,
    pub category: String,
    pub priority: NotifyPriority,
    pub read: bool,
    pub order_kind: Option<OrderKind>,
    pub order_id: Option<i64>,
    pub created_at: i64,
}

/// Payload handed to the notification sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub role: Role,
    pub recipient_id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub category: String,
    pub priority: NotifyPriority,
    pub order_kind: Option<OrderKind>,
    pub order_id: Option<i64>,
}
