//! Brand repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use model2design_core::BrandId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Brand, NewBrand};

/// Storage for brands.
#[async_trait]
pub trait BrandRepository: Send + Sync {
    /// The active brand serving `subdomain` (already lower-cased).
    async fn find_active_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<Brand>, RepositoryError>;

    /// The active default brand.
    async fn find_default(&self) -> Result<Option<Brand>, RepositoryError>;

    async fn get(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Brand>, RepositoryError>;

    /// Clear the default flag on a deactivated default brand so a new
    /// default can be created. Returns how many rows changed.
    async fn demote_inactive_default(&self) -> Result<u64, RepositoryError>;

    /// Insert a brand.
    ///
    /// # Errors
    ///
    /// `RepositoryError::Conflict` when the slug or subdomain is taken, or
    /// when a second default brand is inserted.
    async fn create(&self, brand: &NewBrand) -> Result<Brand, RepositoryError>;
}

#[derive(FromRow)]
struct BrandRow {
    id: i32,
    name: String,
    slug: String,
    subdomain: Option<String>,
    headline: String,
    description: String,
    logo_url: Option<String>,
    primary_color: String,
    secondary_color: String,
    contact_email: Option<String>,
    website_url: Option<String>,
    is_default: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BrandRow> for Brand {
    fn from(r: BrandRow) -> Self {
        Self {
            id: BrandId::new(r.id),
            name: r.name,
            slug: r.slug,
            subdomain: r.subdomain,
            headline: r.headline,
            description: r.description,
            logo_url: r.logo_url,
            primary_color: r.primary_color,
            secondary_color: r.secondary_color,
            contact_email: r.contact_email,
            website_url: r.website_url,
            is_default: r.is_default,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const BRAND_COLUMNS: &str = "id, name, slug, subdomain, headline, description, logo_url, \
     primary_color, secondary_color, contact_email, website_url, is_default, is_active, \
     created_at, updated_at";

/// `PostgreSQL` brand repository.
pub struct PgBrandRepository {
    pool: PgPool,
}

impl PgBrandRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        bind: Option<&str>,
    ) -> Result<Option<Brand>, RepositoryError> {
        let sql = format!("SELECT {BRAND_COLUMNS} FROM storefront.brand WHERE {condition} LIMIT 1");
        let mut query = sqlx::query_as::<_, BrandRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        Ok(query.fetch_optional(&self.pool).await?.map(Brand::from))
    }
}

#[async_trait]
impl BrandRepository for PgBrandRepository {
    async fn find_active_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<Brand>, RepositoryError> {
        self.fetch_one_where("subdomain = $1 AND is_active", Some(subdomain))
            .await
    }

    async fn find_default(&self) -> Result<Option<Brand>, RepositoryError> {
        self.fetch_one_where("is_default AND is_active", None).await
    }

    async fn get(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let sql = format!("SELECT {BRAND_COLUMNS} FROM storefront.brand WHERE id = $1");
        let row = sqlx::query_as::<_, BrandRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Brand::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Brand>, RepositoryError> {
        self.fetch_one_where("slug = $1", Some(slug)).await
    }

    async fn demote_inactive_default(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.brand
            SET is_default = FALSE, updated_at = NOW()
            WHERE is_default AND NOT is_active
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn create(&self, brand: &NewBrand) -> Result<Brand, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO storefront.brand
                (name, slug, subdomain, headline, description, logo_url, primary_color,
                 secondary_color, contact_email, website_url, is_default, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {BRAND_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, BrandRow>(&sql)
            .bind(&brand.name)
            .bind(&brand.slug)
            .bind(brand.subdomain.as_deref())
            .bind(&brand.headline)
            .bind(&brand.description)
            .bind(brand.logo_url.as_deref())
            .bind(&brand.primary_color)
            .bind(&brand.secondary_color)
            .bind(brand.contact_email.as_deref())
            .bind(brand.website_url.as_deref())
            .bind(brand.is_default)
            .bind(brand.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "brand slug, subdomain, or default already exists"))?;
        Ok(row.into())
    }
}
