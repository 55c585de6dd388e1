//! Application state for broker-server

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::notify::{DbNotificationSink, NotificationSink};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// Notification delivery sink
    pub notifier: Arc<dyn NotificationSink>,
    /// JWT secret for API authentication
    pub jwt_secret: String,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = db::connect(&config.database_path).await?;
        let notifier: Arc<dyn NotificationSink> = Arc::new(DbNotificationSink::new(pool.clone()));

        Ok(Self {
            pool,
            notifier,
            jwt_secret: config.jwt_secret.clone(),
        })
    }
}
