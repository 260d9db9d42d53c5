//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::db;
use crate::query::{ListingQueryEngine, PagerConfig};
use crate::store::{MemoryStore, PgStore, Store};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Persistence backend for every aggregate.
    store: Arc<dyn Store>,

    /// Listing search over the same backend.
    listings: ListingQueryEngine,

    pager: PagerConfig,

    /// Base for absolute pagination links.
    site_url: Url,
}

impl AppState {
    /// Build state from configuration, connecting to PostgreSQL when a
    /// database URL is configured.
    pub async fn new(config: &Config) -> Result<Self> {
        match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections).await?;
                info!("connected to PostgreSQL");
                Ok(Self::with_store(PgStore::new(pool), config))
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory store");
                Ok(Self::with_store(MemoryStore::new(), config))
            }
        }
    }

    /// Build state around an existing store.
    pub fn with_store<S: Store + 'static>(store: S, config: &Config) -> Self {
        let store = Arc::new(store);
        let listings = ListingQueryEngine::new(store.clone());

        Self {
            inner: Arc::new(AppStateInner {
                store,
                listings,
                pager: config.pager(),
                site_url: config.site_url.clone(),
            }),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub fn listings(&self) -> &ListingQueryEngine {
        &self.inner.listings
    }

    pub fn pager(&self) -> &PagerConfig {
        &self.inner.pager
    }

    pub fn site_url(&self) -> &Url {
        &self.inner.site_url
    }
}
