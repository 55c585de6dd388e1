//! Shared test harness: a file-backed SQLite pool with seeded parties and
//! fleet, plus recording/failing notification sinks.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use broker_server::db;
use broker_server::error::ServiceError;
use broker_server::notify::{BoxError, NotificationSink};
use broker_server::workflow::orders::OrderDraft;
use shared::error::AppError;
use shared::models::{Location, LoadDetails, NotificationRequest};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const BUYER: i64 = 1;
pub const SUPPLIER_A: i64 = 10;
pub const SUPPLIER_B: i64 = 20;
pub const DRIVER_A: i64 = 101;
pub const DRIVER_B: i64 = 201;
pub const VEHICLE_A: i64 = 102;
pub const VEHICLE_B: i64 = 202;

pub struct TestCtx {
    pub pool: SqlitePool,
    pub sink: Arc<RecordingSink>,
    // Dropped last; keeps the database file alive for the pool's lifetime.
    _dir: TempDir,
}

impl TestCtx {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("broker.db");
        let pool = db::connect(db_path.to_str().unwrap()).await.unwrap();
        seed_fleet(&pool).await;
        Self {
            pool,
            sink: Arc::new(RecordingSink::default()),
            _dir: dir,
        }
    }

    pub fn sink(&self) -> &dyn NotificationSink {
        self.sink.as_ref()
    }
}

async fn seed_fleet(pool: &SqlitePool) {
    sqlx::query(
        "INSERT INTO buyers (id, name, company, mobile)
         VALUES (?1, 'Usha', 'Usha Traders', '9000000001')",
    )
    .bind(BUYER)
    .execute(pool)
    .await
    .unwrap();

    for (id, name, company) in [
        (SUPPLIER_A, "Sharma", "Sharma Logistics"),
        (SUPPLIER_B, "Verma", "Verma Transports"),
    ] {
        sqlx::query(
            "INSERT INTO suppliers (id, name, company, mobile) VALUES (?1, ?2, ?3, '9000000002')",
        )
        .bind(id)
        .bind(name)
        .bind(company)
        .execute(pool)
        .await
        .unwrap();
    }

    for (id, supplier_id, name) in [(DRIVER_A, SUPPLIER_A, "Ravi"), (DRIVER_B, SUPPLIER_B, "Mani")]
    {
        sqlx::query(
            "INSERT INTO drivers (id, supplier_id, name, mobile) VALUES (?1, ?2, ?3, '9000000003')",
        )
        .bind(id)
        .bind(supplier_id)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
    }

    for (id, supplier_id, number) in [
        (VEHICLE_A, SUPPLIER_A, "KA-01-AB-1234"),
        (VEHICLE_B, SUPPLIER_B, "TN-07-CD-5678"),
    ] {
        sqlx::query(
            "INSERT INTO vehicles (id, supplier_id, number, vehicle_type)
             VALUES (?1, ?2, ?3, 'open truck')",
        )
        .bind(id)
        .bind(supplier_id)
        .bind(number)
        .execute(pool)
        .await
        .unwrap();
    }
}

pub fn rice_draft() -> OrderDraft {
    OrderDraft {
        load: LoadDetails {
            load_type: "Rice".into(),
            tonnage: 20.0,
            unit_count: Some(400),
        },
        origin: Location {
            state: "Karnataka".into(),
            district: "Bangalore Urban".into(),
            place: "Bangalore".into(),
            sub_area: Some("Yeshwanthpur".into()),
        },
        destination: Location {
            state: "Tamil Nadu".into(),
            district: "Chennai".into(),
            place: "Chennai".into(),
            sub_area: None,
        },
        required_date: "2026-09-10".into(),
        instructions: Some("Tarpaulin cover required".into()),
    }
}

/// Sink that records every request it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<NotificationRequest>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, req: NotificationRequest) -> Result<(), BoxError> {
        self.sent.lock().unwrap().push(req);
        Ok(())
    }
}

impl RecordingSink {
    pub fn kinds_for(&self, recipient_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.recipient_id == recipient_id)
            .map(|r| r.kind.clone())
            .collect()
    }
}

/// Sink that always fails delivery.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn deliver(&self, _req: NotificationRequest) -> Result<(), BoxError> {
        Err("sink unavailable".into())
    }
}

/// Flatten a workflow error to its API shape for assertions.
pub fn app_error(e: ServiceError) -> AppError {
    e.into()
}
