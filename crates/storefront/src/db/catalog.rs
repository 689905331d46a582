//! Product catalog repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use model2design_core::{BrandId, PriceTiers, ProductId};

use super::{RepositoryError, decode_json, encode_json};
use crate::models::{BrandProduct, NewProduct, Offering, Product};

/// Storage for products and their brand listings.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Orderable products the brand lists as available, by name.
    ///
    /// With a `category`, only products tagged with it.
    async fn list_offerings(
        &self,
        brand: BrandId,
        category: Option<&str>,
    ) -> Result<Vec<Offering>, RepositoryError>;

    /// One product as offered by the brand, if it is orderable and available.
    async fn offering(
        &self,
        brand: BrandId,
        product: ProductId,
    ) -> Result<Option<Offering>, RepositoryError>;

    /// A product regardless of brand or availability.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product, or replace the one with the same slug.
    async fn upsert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Insert or replace a brand's listing of a product.
    async fn set_brand_product(&self, listing: &BrandProduct) -> Result<(), RepositoryError>;

    /// List every orderable product that no brand lists yet under `brand`.
    ///
    /// Returns the number of listings created.
    async fn assign_unowned_to_brand(&self, brand: BrandId) -> Result<u64, RepositoryError>;
}

#[derive(FromRow)]
struct ProductRow {
    id: i32,
    slug: String,
    name: String,
    description: String,
    model_url: String,
    thumbnail_url: String,
    categories: Vec<String>,
    sizes: Vec<String>,
    price_tiers: serde_json::Value,
    details: Vec<String>,
    initial_layer: String,
    initial_bumpmap: String,
    supported_bumpmaps: Vec<String>,
    can_order: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(r.id),
            slug: r.slug,
            name: r.name,
            description: r.description,
            model_url: r.model_url,
            thumbnail_url: r.thumbnail_url,
            categories: r.categories,
            sizes: r.sizes,
            price_tiers: decode_json(r.price_tiers, "price tiers")?,
            details: r.details,
            initial_layer: r.initial_layer,
            initial_bumpmap: r.initial_bumpmap,
            supported_bumpmaps: r.supported_bumpmaps,
            can_order: r.can_order,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct OfferingRow {
    #[sqlx(flatten)]
    product: ProductRow,
    custom_price_tiers: serde_json::Value,
}

impl TryFrom<OfferingRow> for Offering {
    type Error = RepositoryError;

    fn try_from(r: OfferingRow) -> Result<Self, Self::Error> {
        let custom_price_tiers: PriceTiers = decode_json(r.custom_price_tiers, "custom price tiers")?;
        Ok(Self {
            product: r.product.try_into()?,
            custom_price_tiers,
        })
    }
}

const PRODUCT_COLUMNS: &str = "p.id, p.slug, p.name, p.description, p.model_url, p.thumbnail_url, \
     p.categories, p.sizes, p.price_tiers, p.details, p.initial_layer, p.initial_bumpmap, \
     p.supported_bumpmaps, p.can_order, p.created_at, p.updated_at";

/// `PostgreSQL` catalog repository.
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_offerings(
        &self,
        brand: BrandId,
        category: Option<&str>,
    ) -> Result<Vec<Offering>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}, bp.custom_price_tiers
            FROM storefront.product p
            JOIN storefront.brand_product bp ON bp.product_id = p.id
            WHERE bp.brand_id = $1
              AND bp.is_available
              AND p.can_order
              AND ($2::TEXT IS NULL OR $2 = ANY(p.categories))
            ORDER BY p.name, p.id
            "
        );
        let rows = sqlx::query_as::<_, OfferingRow>(&sql)
            .bind(brand.as_i32())
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Offering::try_from).collect()
    }

    async fn offering(
        &self,
        brand: BrandId,
        product: ProductId,
    ) -> Result<Option<Offering>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}, bp.custom_price_tiers
            FROM storefront.product p
            JOIN storefront.brand_product bp ON bp.product_id = p.id
            WHERE bp.brand_id = $1 AND p.id = $2 AND bp.is_available AND p.can_order
            "
        );
        let row = sqlx::query_as::<_, OfferingRow>(&sql)
            .bind(brand.as_i32())
            .bind(product.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Offering::try_from).transpose()
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    async fn upsert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO storefront.product AS p
                (slug, name, description, model_url, thumbnail_url, categories, sizes,
                 price_tiers, details, initial_layer, initial_bumpmap, supported_bumpmaps,
                 can_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                model_url = EXCLUDED.model_url,
                thumbnail_url = EXCLUDED.thumbnail_url,
                categories = EXCLUDED.categories,
                sizes = EXCLUDED.sizes,
                price_tiers = EXCLUDED.price_tiers,
                details = EXCLUDED.details,
                initial_layer = EXCLUDED.initial_layer,
                initial_bumpmap = EXCLUDED.initial_bumpmap,
                supported_bumpmaps = EXCLUDED.supported_bumpmaps,
                can_order = EXCLUDED.can_order,
                updated_at = NOW()
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&product.slug)
            .bind(&product.name)
            .bind(&product.description)
            .bind(&product.model_url)
            .bind(&product.thumbnail_url)
            .bind(&product.categories)
            .bind(&product.sizes)
            .bind(encode_json(&product.price_tiers, "price tiers")?)
            .bind(&product.details)
            .bind(&product.initial_layer)
            .bind(&product.initial_bumpmap)
            .bind(&product.supported_bumpmaps)
            .bind(product.can_order)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn set_brand_product(&self, listing: &BrandProduct) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.brand_product (brand_id, product_id, is_available, custom_price_tiers)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (brand_id, product_id) DO UPDATE SET
                is_available = EXCLUDED.is_available,
                custom_price_tiers = EXCLUDED.custom_price_tiers
            ",
        )
        .bind(listing.brand_id.as_i32())
        .bind(listing.product_id.as_i32())
        .bind(listing.is_available)
        .bind(encode_json(&listing.custom_price_tiers, "custom price tiers")?)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;
        Ok(())
    }

    async fn assign_unowned_to_brand(&self, brand: BrandId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.brand_product (brand_id, product_id, is_available)
            SELECT $1, p.id, TRUE
            FROM storefront.product p
            WHERE p.can_order
              AND NOT EXISTS (
                  SELECT 1 FROM storefront.brand_product bp WHERE bp.product_id = p.id
              )
            ON CONFLICT (brand_id, product_id) DO NOTHING
            ",
        )
        .bind(brand.as_i32())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
