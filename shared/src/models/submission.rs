//! Submission model
//!
//! One candidate fulfillment path: a specific order offered to a specific
//! supplier. At most one submission exists per (order, supplier) pair.

use super::order::OrderRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-supplier response status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    New,
    Viewed,
    Responded,
    Confirmed,
    Rejected,
    /// Supplier retracted the submission before forwarding
    Withdrawn,
    /// Another supplier's confirmation was forwarded to the buyer
    Superseded,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Viewed => "viewed",
            Self::Responded => "responded",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::Superseded => "superseded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Rejected | Self::Withdrawn | Self::Superseded
        )
    }

    /// Whether a supplier may still commit a driver/vehicle
    pub fn can_commit(&self) -> bool {
        matches!(self, Self::New | Self::Viewed | Self::Responded)
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "viewed" => Ok(Self::Viewed),
            "responded" => Ok(Self::Responded),
            "confirmed" => Ok(Self::Confirmed),
            "rejected" => Ok(Self::Rejected),
            "withdrawn" => Ok(Self::Withdrawn),
            "superseded" => Ok(Self::Superseded),
            other => Err(format!("unknown submission status: {other}")),
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub order: OrderRef,
    pub supplier_id: i64,
    pub status: SubmissionStatus,
    /// Set once the supplier commits
    pub driver_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub created_at: i64,
    pub responded_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_allowed_only_before_terminal() {
        assert!(SubmissionStatus::New.can_commit());
        assert!(SubmissionStatus::Viewed.can_commit());
        assert!(SubmissionStatus::Responded.can_commit());
        assert!(!SubmissionStatus::Confirmed.can_commit());
        assert!(!SubmissionStatus::Rejected.can_commit());
        assert!(!SubmissionStatus::Withdrawn.can_commit());
        assert!(!SubmissionStatus::Superseded.can_commit());
    }
}
