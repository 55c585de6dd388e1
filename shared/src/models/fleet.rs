//! Fleet and party models
//!
//! Suppliers own drivers and vehicles; cross-supplier references are
//! validation errors on commit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buyer {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: i64,
    pub supplier_id: i64,
    pub name: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub supplier_id: i64,
    pub number: String,
    pub vehicle_type: String,
}
