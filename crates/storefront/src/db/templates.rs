//! Brand-curated template and image repository.
//!
//! These rows are managed by brand staff outside the storefront, so the
//! repository only reads them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use model2design_core::{
    BrandId, BrandImageCategoryId, BrandImageId, BrandTemplateId, DesignTemplateId, ProductId,
};

use super::RepositoryError;
use crate::models::{BrandImage, BrandTemplate, DesignTemplate, Thumbnails};

/// Read access to brand templates and brand images.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// The brand's active design templates by `sort_order`, newest first
    /// within the same order.
    async fn active_design_templates(
        &self,
        brand: BrandId,
    ) -> Result<Vec<DesignTemplate>, RepositoryError>;

    /// One active design template of the brand.
    async fn active_design_template(
        &self,
        id: DesignTemplateId,
        brand: BrandId,
    ) -> Result<Option<DesignTemplate>, RepositoryError>;

    /// The brand's image library, newest first.
    async fn brand_images(&self, brand: BrandId) -> Result<Vec<BrandImage>, RepositoryError>;

    /// Public templates of active brands, featured first, then most used.
    async fn public_brand_templates(&self) -> Result<Vec<BrandTemplate>, RepositoryError>;
}

#[derive(FromRow)]
struct DesignTemplateRow {
    id: i32,
    brand_id: i32,
    name: String,
    description: String,
    product_id: i32,
    data: serde_json::Value,
    thumbnail_front: Option<String>,
    thumbnail_back: Option<String>,
    thumbnail_left: Option<String>,
    thumbnail_right: Option<String>,
    is_active: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DesignTemplateRow> for DesignTemplate {
    fn from(r: DesignTemplateRow) -> Self {
        Self {
            id: DesignTemplateId::new(r.id),
            brand_id: BrandId::new(r.brand_id),
            name: r.name,
            description: r.description,
            product_id: ProductId::new(r.product_id),
            data: r.data,
            thumbnails: Thumbnails {
                front: r.thumbnail_front,
                back: r.thumbnail_back,
                left: r.thumbnail_left,
                right: r.thumbnail_right,
            },
            is_active: r.is_active,
            sort_order: r.sort_order,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct BrandImageRow {
    id: i32,
    brand_id: i32,
    category_id: Option<i32>,
    name: String,
    image_url: String,
    thumbnail_url: String,
    width: Option<i32>,
    height: Option<i32>,
    file_size: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BrandImageRow> for BrandImage {
    type Error = RepositoryError;

    fn try_from(r: BrandImageRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str| {
            RepositoryError::DataCorruption(format!("negative {field} for brand image {}", r.id))
        };
        Ok(Self {
            id: BrandImageId::new(r.id),
            brand_id: BrandId::new(r.brand_id),
            category_id: r.category_id.map(BrandImageCategoryId::new),
            width: r.width.map(u32::try_from).transpose().map_err(|_| corrupt("width"))?,
            height: r.height.map(u32::try_from).transpose().map_err(|_| corrupt("height"))?,
            file_size: r
                .file_size
                .map(u64::try_from)
                .transpose()
                .map_err(|_| corrupt("file size"))?,
            name: r.name,
            image_url: r.image_url,
            thumbnail_url: r.thumbnail_url,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct BrandTemplateRow {
    id: i32,
    name: String,
    brand_name: String,
    thumbnail_url: String,
    usage_count: i32,
    is_featured: bool,
}

impl TryFrom<BrandTemplateRow> for BrandTemplate {
    type Error = RepositoryError;

    fn try_from(r: BrandTemplateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BrandTemplateId::new(r.id),
            usage_count: u32::try_from(r.usage_count).map_err(|_| {
                RepositoryError::DataCorruption(format!("negative usage count for template {}", r.id))
            })?,
            name: r.name,
            brand_name: r.brand_name,
            thumbnail_url: r.thumbnail_url,
            is_featured: r.is_featured,
        })
    }
}

const DESIGN_TEMPLATE_COLUMNS: &str = "id, brand_id, name, description, product_id, data, \
     thumbnail_front, thumbnail_back, thumbnail_left, thumbnail_right, is_active, sort_order, \
     created_at, updated_at";

/// `PostgreSQL` template repository.
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn active_design_templates(
        &self,
        brand: BrandId,
    ) -> Result<Vec<DesignTemplate>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {DESIGN_TEMPLATE_COLUMNS}
            FROM storefront.design_template
            WHERE brand_id = $1 AND is_active
            ORDER BY sort_order, created_at DESC, id DESC
            "
        );
        let rows = sqlx::query_as::<_, DesignTemplateRow>(&sql)
            .bind(brand.as_i32())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(DesignTemplate::from).collect())
    }

    async fn active_design_template(
        &self,
        id: DesignTemplateId,
        brand: BrandId,
    ) -> Result<Option<DesignTemplate>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {DESIGN_TEMPLATE_COLUMNS}
            FROM storefront.design_template
            WHERE id = $1 AND brand_id = $2 AND is_active
            "
        );
        let row = sqlx::query_as::<_, DesignTemplateRow>(&sql)
            .bind(id.as_i32())
            .bind(brand.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(DesignTemplate::from))
    }

    async fn brand_images(&self, brand: BrandId) -> Result<Vec<BrandImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandImageRow>(
            r"
            SELECT id, brand_id, category_id, name, image_url, thumbnail_url,
                   width, height, file_size, created_at
            FROM storefront.brand_image
            WHERE brand_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(brand.as_i32())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BrandImage::try_from).collect()
    }

    async fn public_brand_templates(&self) -> Result<Vec<BrandTemplate>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandTemplateRow>(
            r"
            SELECT t.id, t.name, b.name AS brand_name, t.thumbnail_url, t.usage_count,
                   t.is_featured
            FROM storefront.brand_template t
            JOIN storefront.brand b ON b.id = t.brand_id
            WHERE t.is_public AND b.is_active
            ORDER BY t.is_featured DESC, t.usage_count DESC, t.id
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BrandTemplate::try_from).collect()
    }
}
