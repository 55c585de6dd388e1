//! broker-server — order fulfillment workflow engine
//!
//! Brokers transport orders between buyers and suppliers: buyers (or an
//! admin) create orders, the admin broadcasts them to suppliers, suppliers
//! commit a driver and vehicle, and the admin forwards exactly one
//! confirmation to the buyer before the order is completed.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod state;
pub mod workflow;
