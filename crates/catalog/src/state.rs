//! Application state shared across handlers.

use std::sync::Arc;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::db::{RepositoryError, StoreRecord, StoreRepository};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CatalogConfig,
    pool: PgPool,
    stores: Cache<String, Arc<StoreRecord>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: CatalogConfig, pool: PgPool) -> Self {
        let stores = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.store_cache_ttl)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                stores,
            }),
        }
    }

    /// Get a reference to the catalog configuration.
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Look up an enabled store, caching hits.
    ///
    /// Misses are not cached so a store published moments ago is found on
    /// its first webhook.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup query fails.
    pub async fn store(&self, shop_name: &str) -> Result<Option<Arc<StoreRecord>>, RepositoryError> {
        if let Some(store) = self.inner.stores.get(shop_name).await {
            debug!(shop_name, "Cache hit for store");
            return Ok(Some(store));
        }

        let Some(store) = StoreRepository::new(self.pool()).get_enabled(shop_name).await? else {
            return Ok(None);
        };

        let store = Arc::new(store);
        self.inner
            .stores
            .insert(shop_name.to_owned(), Arc::clone(&store))
            .await;
        Ok(Some(store))
    }

    /// Drop a cached store after its entry changed.
    pub async fn forget_store(&self, shop_name: &str) {
        self.inner.stores.invalidate(shop_name).await;
    }

    /// Seed the store cache. Used by tests that run without a database.
    #[doc(hidden)]
    pub async fn cache_store(&self, store: StoreRecord) {
        self.inner
            .stores
            .insert(store.shop_name.clone(), Arc::new(store))
            .await;
    }
}
