use std::sync::Arc;

use crate::catalog_cache::CatalogCache;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: custodia_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Transactional custody store over `pool`.
    pub store: Arc<custodia_db::PgCustodyStore>,
    /// Change notices from the workflows are published here.
    pub event_bus: Arc<custodia_events::EventBus>,
    /// Asset catalog snapshot shared by search and commit.
    pub catalog: Arc<CatalogCache>,
}

impl AppState {
    /// Assemble the state around one pool and bus.
    pub fn new(
        pool: custodia_db::DbPool,
        config: ServerConfig,
        event_bus: Arc<custodia_events::EventBus>,
    ) -> Self {
        let ttl = std::time::Duration::from_secs(config.catalog_cache_ttl_secs);
        Self {
            store: Arc::new(custodia_db::PgCustodyStore::new(pool.clone())),
            pool,
            config: Arc::new(config),
            event_bus,
            catalog: Arc::new(CatalogCache::new(ttl)),
        }
    }
}
