//! Order model
//!
//! Two order variants share one shape: buyer-originated orders and
//! admin-originated ("manual") orders. They live in separate tables but
//! are addressed uniformly through [`OrderRef`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle status
///
/// The happy path advances one rung at a time:
/// `draft → submitted → pending → assigned → confirmed → sent_to_buyer → completed`.
/// `cancelled` and `rejected` are terminal and reachable from any
/// pre-completed status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    Submitted,
    Pending,
    Assigned,
    Confirmed,
    SentToBuyer,
    Completed,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Confirmed => "confirmed",
            Self::SentToBuyer => "sent_to_buyer",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// Position on the forward ladder; terminal failures have no rank
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Draft => Some(0),
            Self::Submitted => Some(1),
            Self::Pending => Some(2),
            Self::Assigned => Some(3),
            Self::Confirmed => Some(4),
            Self::SentToBuyer => Some(5),
            Self::Completed => Some(6),
            Self::Cancelled | Self::Rejected => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }

    /// Whether `next` is a legal transition from this status.
    ///
    /// Forward moves advance exactly one rung; skipping a rung would skip
    /// the admin mediation the workflow requires. Cancel/reject are allowed
    /// from any non-terminal status.
    pub fn can_transition(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(cur), Some(nxt)) => nxt == cur + 1,
            (None, Some(_)) => false,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "confirmed" => Ok(Self::Confirmed),
            "sent_to_buyer" => Ok(Self::SentToBuyer),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two order tables a row lives in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Buyer,
    Manual,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown order kind: {other}")),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged reference to either order variant.
///
/// Submission and ledger logic dispatches on the tag instead of duplicating
/// queries per order table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OrderRef {
    pub kind: OrderKind,
    pub id: i64,
}

impl OrderRef {
    pub fn buyer(id: i64) -> Self {
        Self {
            kind: OrderKind::Buyer,
            id,
        }
    }

    pub fn manual(id: i64) -> Self {
        Self {
            kind: OrderKind::Manual,
            id,
        }
    }
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A point in the origin/destination hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub state: String,
    pub district: String,
    pub place: String,
    pub sub_area: Option<String>,
}

impl Location {
    /// One-line rendering for ledger snapshots and notifications
    pub fn summary(&self) -> String {
        match &self.sub_area {
            Some(sub) => format!("{}, {}, {}, {}", sub, self.place, self.district, self.state),
            None => format!("{}, {}, {}", self.place, self.district, self.state),
        }
    }
}

/// Cargo description shared by both order variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadDetails {
    pub load_type: String,
    /// Tonnage in metric tons
    pub tonnage: f64,
    pub unit_count: Option<i32>,
}

/// Buyer-originated order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerOrder {
    pub id: i64,
    /// Allocated on submit; `None` while still a draft
    pub order_no: Option<String>,
    pub buyer_id: i64,
    pub load: LoadDetails,
    pub origin: Location,
    pub destination: Location,
    /// Required pickup date, ISO `YYYY-MM-DD`
    pub required_date: String,
    pub instructions: Option<String>,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Admin-originated ("manual") order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualOrder {
    pub id: i64,
    pub order_no: Option<String>,
    /// Admin who created the order
    pub created_by: i64,
    /// Optional direct supplier assignment made at creation
    pub assigned_supplier_id: Option<i64>,
    pub load: LoadDetails,
    pub origin: Location,
    pub destination: Location,
    pub required_date: String,
    pub instructions: Option<String>,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_advances_one_rung_at_a_time() {
        let ladder = [
            OrderStatus::Draft,
            OrderStatus::Submitted,
            OrderStatus::Pending,
            OrderStatus::Assigned,
            OrderStatus::Confirmed,
            OrderStatus::SentToBuyer,
            OrderStatus::Completed,
        ];
        for pair in ladder.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn skipping_admin_mediation_is_rejected() {
        assert!(!OrderStatus::Submitted.can_transition(OrderStatus::Confirmed));
        assert!(!OrderStatus::Draft.can_transition(OrderStatus::Assigned));
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::SentToBuyer));
    }

    #[test]
    fn backward_moves_are_rejected() {
        assert!(!OrderStatus::Assigned.can_transition(OrderStatus::Pending));
        assert!(!OrderStatus::SentToBuyer.can_transition(OrderStatus::Draft));
    }

    #[test]
    fn cancel_and_reject_reachable_until_completed() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::Submitted,
            OrderStatus::Pending,
            OrderStatus::Assigned,
            OrderStatus::Confirmed,
            OrderStatus::SentToBuyer,
        ] {
            assert!(status.can_transition(OrderStatus::Cancelled));
            assert!(status.can_transition(OrderStatus::Rejected));
        }
        assert!(!OrderStatus::Completed.can_transition(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition(OrderStatus::Rejected));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::SentToBuyer,
            OrderStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn location_summary_includes_sub_area_when_present() {
        let mut loc = Location {
            state: "Karnataka".into(),
            district: "Bangalore Urban".into(),
            place: "Bangalore".into(),
            sub_area: None,
        };
        assert_eq!(loc.summary(), "Bangalore, Bangalore Urban, Karnataka");
        loc.sub_area = Some("Yeshwanthpur".into());
        assert!(loc.summary().starts_with("Yeshwanthpur, "));
    }
}
