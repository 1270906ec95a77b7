//! Application state shared across handlers.

use std::sync::Arc;

use grantly_core::Config;
use grantly_db::{GrantRepository, SystemRepository, UserRepository};
use grantly_services::BulkUploadService;
use sqlx::PgPool;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub bulk_upload: BulkUploadService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let users = Arc::new(UserRepository::new(pool.clone()));
        let systems = Arc::new(SystemRepository::new(pool.clone()));
        let grants = Arc::new(GrantRepository::new(pool.clone()));
        let bulk_upload = BulkUploadService::new(users, systems, grants);

        Self {
            config,
            pool,
            bulk_upload,
        }
    }
}
