// --- File: crates/services/bookify_backend/src/app_state.rs ---
use crate::service_factory::BookifyServiceFactory;
use bookify_config::AppConfig;
use bookify_db::{DbClient, DbError, Repositories};
use std::sync::Arc;

/// Application state shared across all routes: the loaded configuration,
/// the repository bundle over one connection pool, and the service factory
/// handing out external-service instances.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repos: Arc<Repositories>,
    pub service_factory: Arc<BookifyServiceFactory>,
}

impl AppState {
    /// Connect to the database and build the shared state.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, DbError> {
        let db_client = DbClient::new(&config).await?;
        let repos = Arc::new(Repositories::new(db_client));
        let service_factory = Arc::new(BookifyServiceFactory::new(&config));

        Ok(Self {
            config,
            repos,
            service_factory,
        })
    }
}
