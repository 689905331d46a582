//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::Repositories;
use crate::services::mailer::Mailer;
use crate::storage::FileStorage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like repositories, storage, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    repos: Repositories,
    storage: Arc<dyn FileStorage>,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` pool, `None` when running on in-memory repositories
    /// * `repos` - Repositories for every aggregate
    /// * `storage` - Where uploaded files are written
    /// * `mailer` - Outbound email
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        pool: Option<PgPool>,
        repos: Repositories,
        storage: Arc<dyn FileStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                repos,
                storage,
                mailer,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The database pool, absent on the in-memory backend.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    #[must_use]
    pub fn storage(&self) -> &dyn FileStorage {
        self.inner.storage.as_ref()
    }

    /// A handle to the mailer that can be moved into a background task.
    #[must_use]
    pub fn mailer(&self) -> Arc<dyn Mailer> {
        Arc::clone(&self.inner.mailer)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("postgres", &self.inner.pool.is_some())
            .finish_non_exhaustive()
    }
}
