//! Design repository.
//!
//! Owner-scoped queries bind the owner as two parameters, `$1` user id and
//! `$2` guest id, exactly one of which is non-null. `user_id = NULL` is never
//! true, so `(user_id = $1 OR guest_id = $2)` matches only the caller's rows.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use model2design_core::{BrandId, DesignId, GuestId, Owner, ProductId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{
    DESIGNS_PER_PAGE, Design, DesignListQuery, DesignStats, DesignUpdate, NewDesign, Thumbnails,
};

const NAME_TAKEN: &str = "design name already exists";

/// Storage for saved designs.
#[async_trait]
pub trait DesignRepository: Send + Sync {
    /// # Errors
    ///
    /// `RepositoryError::Conflict` when the user already has a design with
    /// this name in the brand.
    async fn insert(&self, design: &NewDesign) -> Result<Design, RepositoryError>;

    /// A design, only when `owner` owns it.
    async fn find_owned(
        &self,
        id: DesignId,
        owner: Owner,
    ) -> Result<Option<Design>, RepositoryError>;

    /// A design, only when it is public.
    async fn find_public(&self, id: DesignId) -> Result<Option<Design>, RepositoryError>;

    /// Overwrite an owned design. `None` when the owner does not own it.
    ///
    /// # Errors
    ///
    /// `RepositoryError::Conflict` on a duplicate name.
    async fn update(
        &self,
        id: DesignId,
        owner: Owner,
        update: &DesignUpdate,
    ) -> Result<Option<Design>, RepositoryError>;

    /// Returns whether an owned design was updated.
    async fn set_visibility(
        &self,
        id: DesignId,
        owner: Owner,
        public: bool,
    ) -> Result<bool, RepositoryError>;

    /// Returns whether an owned design was deleted.
    async fn delete(&self, id: DesignId, owner: Owner) -> Result<bool, RepositoryError>;

    /// Number of the owner's designs in the brand matching the search.
    async fn count_matching(
        &self,
        owner: Owner,
        brand: BrandId,
        search: Option<&str>,
    ) -> Result<i64, RepositoryError>;

    /// One page of the owner's designs in the brand.
    async fn list(
        &self,
        owner: Owner,
        brand: BrandId,
        query: &DesignListQuery,
    ) -> Result<Vec<Design>, RepositoryError>;

    async fn stats(&self, owner: Owner, brand: BrandId) -> Result<DesignStats, RepositoryError>;

    /// Names of the user's designs in the brand.
    async fn names(&self, user: UserId, brand: BrandId) -> Result<Vec<String>, RepositoryError>;

    /// Number of designs the user owns across all brands.
    async fn count_for_user(&self, user: UserId) -> Result<i64, RepositoryError>;

    /// Every design owned by the guest, oldest first.
    async fn guest_designs(&self, guest: GuestId) -> Result<Vec<Design>, RepositoryError>;

    /// Move a guest design to a user under `name`.
    ///
    /// Returns `false` when the guest no longer owns the design.
    ///
    /// # Errors
    ///
    /// `RepositoryError::Conflict` when the user already uses `name`.
    async fn transfer_to_user(
        &self,
        id: DesignId,
        guest: GuestId,
        user: UserId,
        name: &str,
    ) -> Result<bool, RepositoryError>;
}

#[derive(FromRow)]
struct DesignRow {
    id: i32,
    user_id: Option<i32>,
    guest_id: Option<Uuid>,
    brand_id: i32,
    name: String,
    product_id: i32,
    data: serde_json::Value,
    thumbnail_front: Option<String>,
    thumbnail_back: Option<String>,
    thumbnail_left: Option<String>,
    thumbnail_right: Option<String>,
    public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DesignRow> for Design {
    type Error = RepositoryError;

    fn try_from(r: DesignRow) -> Result<Self, Self::Error> {
        let owner = Owner::from_columns(r.user_id, r.guest_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("design {} has no single owner", r.id))
        })?;
        Ok(Self {
            id: DesignId::new(r.id),
            owner,
            brand_id: BrandId::new(r.brand_id),
            name: r.name,
            product_id: ProductId::new(r.product_id),
            data: r.data,
            thumbnails: Thumbnails {
                front: r.thumbnail_front,
                back: r.thumbnail_back,
                left: r.thumbnail_left,
                right: r.thumbnail_right,
            },
            public: r.public,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const DESIGN_COLUMNS: &str = "id, user_id, guest_id, brand_id, name, product_id, data, \
     thumbnail_front, thumbnail_back, thumbnail_left, thumbnail_right, public, \
     created_at, updated_at";

const OWNED_BY: &str = "(user_id = $1 OR guest_id = $2)";

const SEARCH_MATCHES: &str = "($4::TEXT IS NULL OR name ILIKE '%' || $4 || '%' ESCAPE '\\')";

/// Escape `LIKE` wildcards so a search matches literally.
fn like_escape(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `PostgreSQL` design repository.
pub struct PgDesignRepository {
    pool: PgPool,
}

impl PgDesignRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DesignRepository for PgDesignRepository {
    async fn insert(&self, design: &NewDesign) -> Result<Design, RepositoryError> {
        let (user_id, guest_id) = design.owner.to_columns();
        let sql = format!(
            r"
            INSERT INTO storefront.design
                (user_id, guest_id, brand_id, name, product_id, data,
                 thumbnail_front, thumbnail_back, thumbnail_left, thumbnail_right, public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {DESIGN_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, DesignRow>(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(design.brand_id.as_i32())
            .bind(&design.name)
            .bind(design.product_id.as_i32())
            .bind(&design.data)
            .bind(design.thumbnails.front.as_deref())
            .bind(design.thumbnails.back.as_deref())
            .bind(design.thumbnails.left.as_deref())
            .bind(design.thumbnails.right.as_deref())
            .bind(design.public)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, NAME_TAKEN))?;
        row.try_into()
    }

    async fn find_owned(
        &self,
        id: DesignId,
        owner: Owner,
    ) -> Result<Option<Design>, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            "SELECT {DESIGN_COLUMNS} FROM storefront.design WHERE {OWNED_BY} AND id = $3"
        );
        let row = sqlx::query_as::<_, DesignRow>(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Design::try_from).transpose()
    }

    async fn find_public(&self, id: DesignId) -> Result<Option<Design>, RepositoryError> {
        let sql = format!("SELECT {DESIGN_COLUMNS} FROM storefront.design WHERE id = $1 AND public");
        let row = sqlx::query_as::<_, DesignRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Design::try_from).transpose()
    }

    async fn update(
        &self,
        id: DesignId,
        owner: Owner,
        update: &DesignUpdate,
    ) -> Result<Option<Design>, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            r"
            UPDATE storefront.design SET
                brand_id = $4,
                name = $5,
                product_id = $6,
                data = $7,
                thumbnail_front = COALESCE($8, thumbnail_front),
                thumbnail_back = COALESCE($9, thumbnail_back),
                thumbnail_left = COALESCE($10, thumbnail_left),
                thumbnail_right = COALESCE($11, thumbnail_right),
                public = $12,
                updated_at = NOW()
            WHERE {OWNED_BY} AND id = $3
            RETURNING {DESIGN_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, DesignRow>(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(id.as_i32())
            .bind(update.brand_id.as_i32())
            .bind(&update.name)
            .bind(update.product_id.as_i32())
            .bind(&update.data)
            .bind(update.thumbnails.front.as_deref())
            .bind(update.thumbnails.back.as_deref())
            .bind(update.thumbnails.left.as_deref())
            .bind(update.thumbnails.right.as_deref())
            .bind(update.public)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, NAME_TAKEN))?;
        row.map(Design::try_from).transpose()
    }

    async fn set_visibility(
        &self,
        id: DesignId,
        owner: Owner,
        public: bool,
    ) -> Result<bool, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            "UPDATE storefront.design SET public = $4, updated_at = NOW() \
             WHERE {OWNED_BY} AND id = $3"
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(id.as_i32())
            .bind(public)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: DesignId, owner: Owner) -> Result<bool, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!("DELETE FROM storefront.design WHERE {OWNED_BY} AND id = $3");
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_matching(
        &self,
        owner: Owner,
        brand: BrandId,
        search: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            "SELECT COUNT(*) FROM storefront.design \
             WHERE {OWNED_BY} AND brand_id = $3 AND {SEARCH_MATCHES}"
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(brand.as_i32())
            .bind(search.map(like_escape))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(
        &self,
        owner: Owner,
        brand: BrandId,
        query: &DesignListQuery,
    ) -> Result<Vec<Design>, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            r"
            SELECT {DESIGN_COLUMNS}
            FROM storefront.design
            WHERE {OWNED_BY} AND brand_id = $3 AND {SEARCH_MATCHES}
            ORDER BY {}
            LIMIT $5 OFFSET $6
            ",
            query.order.sql()
        );
        let rows = sqlx::query_as::<_, DesignRow>(&sql)
            .bind(user_id)
            .bind(guest_id)
            .bind(brand.as_i32())
            .bind(query.search.as_deref().map(like_escape))
            .bind(i64::from(DESIGNS_PER_PAGE))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Design::try_from).collect()
    }

    async fn stats(&self, owner: Owner, brand: BrandId) -> Result<DesignStats, RepositoryError> {
        let (user_id, guest_id) = owner.to_columns();
        let sql = format!(
            r"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE created_at >= $4),
                   COUNT(DISTINCT product_id)
            FROM storefront.design
            WHERE {OWNED_BY} AND brand_id = $3
            "
        );
        let (total_designs, recent_designs, products_designed): (i64, i64, i64) =
            sqlx::query_as(&sql)
                .bind(user_id)
                .bind(guest_id)
                .bind(brand.as_i32())
                .bind(Utc::now() - Duration::days(7))
                .fetch_one(&self.pool)
                .await?;
        Ok(DesignStats {
            total_designs,
            recent_designs,
            products_designed,
        })
    }

    async fn names(&self, user: UserId, brand: BrandId) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar(
            "SELECT name FROM storefront.design WHERE user_id = $1 AND brand_id = $2",
        )
        .bind(user.as_i32())
        .bind(brand.as_i32())
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn count_for_user(&self, user: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.design WHERE user_id = $1")
            .bind(user.as_i32())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn guest_designs(&self, guest: GuestId) -> Result<Vec<Design>, RepositoryError> {
        let sql = format!(
            "SELECT {DESIGN_COLUMNS} FROM storefront.design WHERE guest_id = $1 \
             ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, DesignRow>(&sql)
            .bind(guest.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Design::try_from).collect()
    }

    async fn transfer_to_user(
        &self,
        id: DesignId,
        guest: GuestId,
        user: UserId,
        name: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.design
            SET user_id = $3, guest_id = NULL, name = $4, updated_at = NOW()
            WHERE id = $1 AND guest_id = $2
            ",
        )
        .bind(id.as_i32())
        .bind(guest.as_uuid())
        .bind(user.as_i32())
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, NAME_TAKEN))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_escape() {
        assert_eq!(like_escape("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(like_escape("hoodie"), "hoodie");
    }
}
