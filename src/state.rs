use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::{Catalog, PrizeSpec};
use crate::services::automation::NotificationGateway;
use crate::services::clock::Clock;
use crate::services::random::RandomSource;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub catalog: Catalog,
    pub prizes: Vec<PrizeSpec>,
    pub gateway: Box<dyn NotificationGateway>,
    pub clock: Box<dyn Clock>,
    pub rng: Box<dyn RandomSource>,
}

impl AppState {
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
