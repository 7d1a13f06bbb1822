use std::sync::Arc;

use chrono::Duration;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::AppError;
use crate::views::Views;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub views: Arc<Views>,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            db,
            views: Arc::new(Views::new()?),
            session_ttl: config.session_ttl,
        })
    }
}
