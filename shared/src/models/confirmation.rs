//! Confirmation ledger model
//!
//! Append-only record of supplier confirmations. The supplier's original
//! entry carries `forwarded_to_buyer = false`; the admin's forward action
//! appends a second entry (a copy addressed to a buyer) rather than mutating
//! the original, so the supplier's acceptance stays an immutable audit
//! record. Only the terminal `completed` flag is ever written afterward.

use super::order::OrderRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal status mirrored from the order on completion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    #[default]
    Active,
    Completed,
}

impl ConfirmationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for ConfirmationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown confirmation status: {other}")),
        }
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry: denormalized snapshot of a supplier's acceptance.
///
/// Route and load fields are copied at confirmation time so the record
/// displays stably even if the order is edited later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    pub id: i64,
    /// Originating submission
    pub submission_id: i64,
    pub order: OrderRef,
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
    /// Set only on forwarded copies
    pub buyer_id: Option<i64>,
    pub status: ConfirmationStatus,
    pub created_at: i64,
}
