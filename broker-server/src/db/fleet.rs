//! Supplier, buyer, driver and vehicle lookups.

use shared::models::{Buyer, Driver, Supplier, Vehicle};
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
pub struct SupplierRow {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub mobile: String,
}

impl SupplierRow {
    pub fn into_model(self) -> Supplier {
        Supplier {
            id: self.id,
            name: self.name,
            company: self.company,
            mobile: self.mobile,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct BuyerRow {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub mobile: String,
}

impl BuyerRow {
    pub fn into_model(self) -> Buyer {
        Buyer {
            id: self.id,
            name: self.name,
            company: self.company,
            mobile: self.mobile,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DriverRow {
    pub id: i64,
    pub supplier_id: i64,
    pub name: String,
    pub mobile: String,
}

impl DriverRow {
    pub fn into_model(self) -> Driver {
        Driver {
            id: self.id,
            supplier_id: self.supplier_id,
            name: self.name,
            mobile: self.mobile,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct VehicleRow {
    pub id: i64,
    pub supplier_id: i64,
    pub number: String,
    pub vehicle_type: String,
}

impl VehicleRow {
    pub fn into_model(self) -> Vehicle {
        Vehicle {
            id: self.id,
            supplier_id: self.supplier_id,
            number: self.number,
            vehicle_type: self.vehicle_type,
        }
    }
}

pub async fn supplier_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<SupplierRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM suppliers WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn buyer_by_id(pool: &SqlitePool, id: i64) -> Result<Option<BuyerRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM buyers WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn driver_by_id(pool: &SqlitePool, id: i64) -> Result<Option<DriverRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM drivers WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn vehicle_by_id(pool: &SqlitePool, id: i64) -> Result<Option<VehicleRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM vehicles WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn drivers_for_supplier(
    pool: &SqlitePool,
    supplier_id: i64,
) -> Result<Vec<DriverRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM drivers WHERE supplier_id = ?1 ORDER BY name")
        .bind(supplier_id)
        .fetch_all(pool)
        .await
}

pub async fn vehicles_for_supplier(
    pool: &SqlitePool,
    supplier_id: i64,
) -> Result<Vec<VehicleRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM vehicles WHERE supplier_id = ?1 ORDER BY number")
        .bind(supplier_id)
        .fetch_all(pool)
        .await
}
