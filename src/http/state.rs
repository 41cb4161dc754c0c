use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use super::error::ApiError;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

pub struct AppState {
    pub config: Config,
    /// The single SQLite connection; holding the lock serializes writes.
    pub db: Mutex<DbPool>,
}

impl AppState {
    pub fn new(config: Config, pool: DbPool) -> Arc<Self> {
        Arc::new(Self {
            config,
            db: Mutex::new(pool),
        })
    }

    /// Open (and migrate) the configured database.
    pub fn open(config: Config) -> AppResult<Arc<Self>> {
        let pool = DbPool::new(&config.database)?;
        init_db(&pool.conn)?;
        Ok(Self::new(config, pool))
    }

    /// Run `f` against the connection on the blocking pool, off the async workers.
    pub async fn with_db<T, F>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let pool = state.db.blocking_lock();
            f(&pool.conn)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    }
}
