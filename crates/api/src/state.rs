use std::sync::Arc;

use formkit_core::definition_cache::DefinitionCache;
use formkit_core::ordering::OrderManager;
use formkit_core::template::TemplateLoader;
use formkit_db::PgFormStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: formkit_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Per-site form lists. Every form mutation goes through it.
    pub forms: Arc<DefinitionCache<PgFormStore>>,
    pub ordering: Arc<OrderManager<PgFormStore>>,
    pub templates: Arc<TemplateLoader>,
}

impl AppState {
    /// Build the state and its caches from a pool and configuration.
    pub fn new(pool: formkit_db::DbPool, config: ServerConfig) -> Self {
        let store = PgFormStore::new(pool.clone());
        Self {
            forms: Arc::new(DefinitionCache::new(store.clone(), config.form_cache_ttl())),
            ordering: Arc::new(OrderManager::new(store, config.taxis_swap_mode)),
            templates: Arc::new(TemplateLoader::new(config.template_settings())),
            config: Arc::new(config),
            pool,
        }
    }
}
