//! Unified error system for the freight broker
//!
//! - [`ErrorCode`]: standardized error codes for all failure classes
//! - [`AppError`]: rich error type with codes, messages, and details
//! - [`ApiResponse`]: unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Submission errors
//! - 6xxx: Confirmation / forwarding errors
//! - 9xxx: System errors

mod codes;
mod http;
mod types;

pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError};
