//! Uploaded image repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use model2design_core::{DesignImageId, GuestId, Owner, UserId};

use super::RepositoryError;
use crate::models::{DesignImage, NewDesignImage};

/// Storage for customer-uploaded images.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn insert(&self, image: &NewDesignImage) -> Result<DesignImage, RepositoryError>;

    /// The owner's images, newest first.
    async fn list(&self, owner: Owner) -> Result<Vec<DesignImage>, RepositoryError>;

    /// Delete an owned image, returning it. `None` when not owned.
    async fn delete(
        &self,
        id: DesignImageId,
        owner: Owner,
    ) -> Result<Option<DesignImage>, RepositoryError>;

    /// Give all of a guest's images to a user. Returns how many moved.
    async fn reassign_guest(&self, guest: GuestId, user: UserId) -> Result<u64, RepositoryError>;
}

#[derive(FromRow)]
struct ImageRow {
    id: i32,
    user_id: Option<i32>,
    guest_id: Option<Uuid>,
    name: String,
    url: String,
    width: i32,
    height: i32,
    file_size: i64,
    content_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ImageRow> for DesignImage {
    type Error = RepositoryError;

    fn try_from(r: ImageRow) -> Result<Self, Self::Error> {
        let owner = Owner::from_columns(r.user_id, r.guest_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("image {} has no single owner", r.id))
        })?;
        let corrupt = |field: &str| {
            RepositoryError::DataCorruption(format!("negative {field} for image {}", r.id))
        };
        Ok(Self {
            id: DesignImageId::new(r.id),
            owner,
            width: u32::try_from(r.width).map_err(|_| corrupt("width"))?,
            height: u32::try_from(r.height).map_err(|_| corrupt("height"))?,
            file_size: u64::try_from(r.file_size).map_err(|_| corrupt("file size"))?,
            name: r.name,
            url: r.url,
            content_type: r.content_type,
            created_at: r.created_at,
        })
    }
}

const IMAGE_COLUMNS: &str =
    "id, user_id, guest_id, name, url, width, height, file_size, content_type, created_at";

/// `PostgreSQL` image repository.
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn insert(&self, image: &NewDesignImage) -> Result<DesignImage, RepositoryError> {
        let (user_id, guest_id) = image.owner.to_columns();
        let sql = format!(
            r"
            INSERT INTO storefront.design_image
                (user_id, guest_id, name, url, width, height, file_size, content_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {IMAGE_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(&image.name)
            .bind(&image.url)
            .bind(i32::try_from(image.width).unwrap_or(i32::MAX))
            .bind(i32::try_from(image.height).unwrap_or(i32::MAX))
            .bind(i64::try_from(image.file_size).unwrap_or(i64::MAX))
            .bind(&image.content_type)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn list(&self, owner: Owner) -> Result<Vec<DesignImage>, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            r"
            SELECT {IMAGE_COLUMNS}
            FROM storefront.design_image
            WHERE user_id = $1 OR guest_id = $2
            ORDER BY created_at DESC, id DESC
            "
        );
        let rows = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(user_id)
            .bind(guest_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(DesignImage::try_from).collect()
    }

    async fn delete(
        &self,
        id: DesignImageId,
        owner: Owner,
    ) -> Result<Option<DesignImage>, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            r"
            DELETE FROM storefront.design_image
            WHERE (user_id = $1 OR guest_id = $2) AND id = $3
            RETURNING {IMAGE_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(DesignImage::try_from).transpose()
    }

    async fn reassign_guest(&self, guest: GuestId, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.design_image SET user_id = $2, guest_id = NULL WHERE guest_id = $1",
        )
        .bind(guest.as_uuid())
        .bind(user.as_i32())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
