//! Unified error codes for the freight broker
//!
//! Error codes are shared between the broker server and its clients.
//! Organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Submission errors
//! - 6xxx: Confirmation / forwarding errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire for cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Orders ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition is not allowed
    InvalidStatusTransition = 4002,
    /// Order number already allocated to another order
    DuplicateOrderNumber = 4003,
    /// Order already completed
    OrderAlreadyCompleted = 4004,
    /// Order still referenced by submissions or confirmations
    OrderHasLiveReferences = 4005,
    /// Buyer not found
    BuyerNotFound = 4006,

    // ==================== 5xxx: Submissions ====================
    /// Submission not found
    SubmissionNotFound = 5001,
    /// Submission is in a terminal status
    SubmissionTerminal = 5002,
    /// Driver not found
    DriverNotFound = 5003,
    /// Vehicle not found
    VehicleNotFound = 5004,
    /// Supplier not found
    SupplierNotFound = 5005,
    /// Driver or vehicle belongs to a different supplier
    CrossTenantReference = 5006,

    // ==================== 6xxx: Confirmations ====================
    /// Confirmation not found
    ConfirmationNotFound = 6001,
    /// A confirmation was already forwarded for this order
    AlreadyForwarded = 6002,
    /// Submission already has a confirmation
    DuplicateConfirmation = 6003,
    /// Submission cannot be withdrawn after forwarding
    WithdrawAfterForward = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Persistence layer unreachable; safe to retry
    Unavailable = 9004,
}

impl ErrorCode {
    /// Default message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::RequiredField => "Required field missing",

            Self::NotAuthenticated => "Authentication required",
            Self::TokenExpired => "Token expired",
            Self::TokenInvalid => "Invalid token",

            Self::PermissionDenied => "Permission denied",
            Self::RoleRequired => "Role required",
            Self::AdminRequired => "Admin role required",

            Self::OrderNotFound => "Order not found",
            Self::InvalidStatusTransition => "Status transition not allowed",
            Self::DuplicateOrderNumber => "Duplicate order number",
            Self::OrderAlreadyCompleted => "Order already completed",
            Self::OrderHasLiveReferences => {
                "Order still referenced by submissions or confirmations"
            }
            Self::BuyerNotFound => "Buyer not found",

            Self::SubmissionNotFound => "Submission not found",
            Self::SubmissionTerminal => "Submission is already terminal",
            Self::DriverNotFound => "Driver not found",
            Self::VehicleNotFound => "Vehicle not found",
            Self::SupplierNotFound => "Supplier not found",
            Self::CrossTenantReference => "Driver or vehicle belongs to a different supplier",

            Self::ConfirmationNotFound => "Confirmation not found",
            Self::AlreadyForwarded => "A confirmation was already forwarded for this order",
            Self::DuplicateConfirmation => "Submission already has a confirmation",
            Self::WithdrawAfterForward => "Submission was forwarded to the buyer",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
            Self::Unavailable => "Service temporarily unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            7 => Self::RequiredField,
            1001 => Self::NotAuthenticated,
            1003 => Self::TokenExpired,
            1004 => Self::TokenInvalid,
            2001 => Self::PermissionDenied,
            2002 => Self::RoleRequired,
            2003 => Self::AdminRequired,
            4001 => Self::OrderNotFound,
            4002 => Self::InvalidStatusTransition,
            4003 => Self::DuplicateOrderNumber,
            4004 => Self::OrderAlreadyCompleted,
            4005 => Self::OrderHasLiveReferences,
            4006 => Self::BuyerNotFound,
            5001 => Self::SubmissionNotFound,
            5002 => Self::SubmissionTerminal,
            5003 => Self::DriverNotFound,
            5004 => Self::VehicleNotFound,
            5005 => Self::SupplierNotFound,
            5006 => Self::CrossTenantReference,
            6001 => Self::ConfirmationNotFound,
            6002 => Self::AlreadyForwarded,
            6003 => Self::DuplicateConfirmation,
            6004 => Self::WithdrawAfterForward,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::ConfigError,
            9004 => Self::Unavailable,
            other => return Err(format!("unknown error code: {other}")),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::AlreadyForwarded,
            ErrorCode::CrossTenantReference,
            ErrorCode::Unavailable,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(ErrorCode::try_from(60_000).is_err());
    }
}
