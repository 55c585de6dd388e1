//! Data models
//!
//! Shared between broker-server and frontend (via API).
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod confirmation;
pub mod fleet;
pub mod notification;
pub mod order;
pub mod submission;

// Re-exports
pub use confirmation::*;
pub use fleet::*;
pub use notification::*;
pub use order::*;
pub use submission::*;
