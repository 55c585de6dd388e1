//! Order fulfillment workflow engine
//!
//! The operations that move an order from creation through broadcast,
//! supplier confirmation, admin-mediated forwarding to the buyer, and
//! completion. Every logical transition runs inside a single database
//! transaction; cross-row invariants (order-number uniqueness, at most one
//! forwarded confirmation per order, one submission per supplier) are
//! enforced by uniqueness constraints rather than check-then-act reads.
//! Notification fan-out happens after commit and is best-effort.

pub mod forwarding;
pub mod orders;
pub mod submissions;

/// Prefix for allocated order numbers (`ORD-<n>`).
pub const ORDER_PREFIX: &str = "ORD";
