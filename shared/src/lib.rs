//! Shared types for the freight broker
//!
//! Domain models, error codes and response structures used by the
//! broker server and its API consumers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
