//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `m2d_storefront`
//!
//! ## Tables (schema `storefront`)
//!
//! - `brand` - Tenants, resolved per request by subdomain
//! - `product`, `brand_product` - Catalog and per-brand availability/pricing
//! - `user`, `password_reset_token` - Customer accounts
//! - `cart`, `cart_item` - Carts of signed-in users
//! - `design`, `design_image` - Saved designs and uploads (user or guest owned)
//! - `support_submission`, `faq`, `tutorial` - Support intake and content
//! - `design_template`, `brand_image`, `brand_image_category`, `brand_template` -
//!   Brand-curated templates and images, read only
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Repositories
//!
//! Every aggregate has a repository trait with a `PostgreSQL` implementation
//! (`Pg*Repository`) and an in-memory one backed by [`memory::MemoryStore`].
//! [`Repositories`] bundles one of each behind `Arc<dyn ...>`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p model2design-cli -- migrate
//! ```

pub mod brands;
pub mod carts;
pub mod catalog;
pub mod designs;
pub mod images;
pub mod memory;
pub mod support;
pub mod templates;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use brands::{BrandRepository, PgBrandRepository};
pub use carts::{CartRepository, PgCartRepository};
pub use catalog::{CatalogRepository, PgCatalogRepository};
pub use designs::{DesignRepository, PgDesignRepository};
pub use images::{ImageRepository, PgImageRepository};
pub use memory::MemoryStore;
pub use support::{PgSupportRepository, SupportRepository};
pub use templates::{PgTemplateRepository, TemplateRepository};
pub use users::{PgUserRepository, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}

/// Decode a JSONB column into a typed value.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_value(value).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid {column} in database: {e}"))
    })
}

/// Encode a value for a JSONB column.
pub(crate) fn encode_json<T: serde::Serialize>(
    value: &T,
    column: &str,
) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("cannot encode {column}: {e}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// One repository per aggregate, shared across requests.
#[derive(Clone)]
pub struct Repositories {
    pub brands: Arc<dyn BrandRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub designs: Arc<dyn DesignRepository>,
    pub images: Arc<dyn ImageRepository>,
    pub users: Arc<dyn UserRepository>,
    pub support: Arc<dyn SupportRepository>,
    pub templates: Arc<dyn TemplateRepository>,
}

impl Repositories {
    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            brands: Arc::new(PgBrandRepository::new(pool.clone())),
            catalog: Arc::new(PgCatalogRepository::new(pool.clone())),
            carts: Arc::new(PgCartRepository::new(pool.clone())),
            designs: Arc::new(PgDesignRepository::new(pool.clone())),
            images: Arc::new(PgImageRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            support: Arc::new(PgSupportRepository::new(pool.clone())),
            templates: Arc::new(PgTemplateRepository::new(pool.clone())),
        }
    }

    /// Repositories sharing a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(&Arc::new(MemoryStore::default()))
    }

    /// Repositories over an existing in-memory store, so a caller can seed
    /// and inspect the same data the application sees.
    #[must_use]
    pub fn from_memory(store: &Arc<MemoryStore>) -> Self {
        Self {
            brands: store.clone(),
            catalog: store.clone(),
            carts: store.clone(),
            designs: store.clone(),
            images: store.clone(),
            users: store.clone(),
            support: store.clone(),
            templates: store.clone(),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
