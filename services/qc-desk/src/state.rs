use std::sync::Arc;

use catalog::CategoryLookup;
use reconcile::TableSchema;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::pg_store::PgNewsStore;

pub type SharedState = Arc<AppState>;

#[derive(Clone)]
pub struct AppState {
    pub store: PgNewsStore,
    pub schema: TableSchema,
    /// Loaded once at startup, read-only afterwards.
    pub categories: Arc<CategoryLookup>,
    pub cfg: AppConfig,
}

impl AppState {
    pub fn new(cfg: AppConfig, pg_pool: PgPool, categories: CategoryLookup) -> Self {
        Self {
            store: PgNewsStore::new(pg_pool),
            schema: TableSchema::news(),
            categories: Arc::new(categories),
            cfg,
        }
    }
}
