//! Cart repository for signed-in users.
//!
//! Every query is scoped by the owning user, so an item id belonging to
//! someone else behaves exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use model2design_core::{CartId, CartItemId, DesignRef, ProductId, SizeQuantities, UserId};

use super::{RepositoryError, conflict_on_unique, decode_json, encode_json};
use crate::models::{CartItem, NewCartItem};

/// Storage for user carts.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The user's cart lines, newest first.
    async fn items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError>;

    async fn find_item(
        &self,
        user: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError>;

    async fn find_item_by_design(
        &self,
        user: UserId,
        design: &DesignRef,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Insert a line, creating the user's cart on first use.
    ///
    /// # Errors
    ///
    /// `RepositoryError::Conflict` when the cart already holds the design.
    async fn insert_item(
        &self,
        user: UserId,
        item: &NewCartItem,
    ) -> Result<CartItem, RepositoryError>;

    /// Replace a line's sizes and unit price.
    async fn update_item(
        &self,
        user: UserId,
        item: CartItemId,
        sizes: &SizeQuantities,
        unit_price: Decimal,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Returns whether a line was deleted.
    async fn delete_item(&self, user: UserId, item: CartItemId) -> Result<bool, RepositoryError>;

    /// Delete every line. Returns how many were removed.
    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError>;
}

#[derive(FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    design_ref: String,
    design_name: String,
    thumbnail: Option<String>,
    product_id: i32,
    sizes: serde_json::Value,
    unit_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(r: CartItemRow) -> Result<Self, Self::Error> {
        let design_ref = DesignRef::parse(&r.design_ref).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid design reference in database: {e}"))
        })?;
        Ok(Self {
            id: CartItemId::new(r.id),
            cart_id: CartId::new(r.cart_id),
            design_ref,
            design_name: r.design_name,
            thumbnail: r.thumbnail,
            product_id: ProductId::new(r.product_id),
            sizes: decode_json(r.sizes, "cart sizes")?,
            unit_price: r.unit_price,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const ITEM_COLUMNS: &str = "i.id, i.cart_id, i.design_ref, i.design_name, i.thumbnail, \
     i.product_id, i.sizes, i.unit_price, i.created_at, i.updated_at";

/// `PostgreSQL` cart repository.
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM storefront.cart_item i
            JOIN storefront.cart c ON c.id = i.cart_id
            WHERE c.user_id = $1
            ORDER BY i.created_at DESC, i.id DESC
            "
        );
        let rows = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(user.as_i32())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(CartItem::try_from).collect()
    }

    async fn find_item(
        &self,
        user: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM storefront.cart_item i
            JOIN storefront.cart c ON c.id = i.cart_id
            WHERE c.user_id = $1 AND i.id = $2
            "
        );
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(user.as_i32())
            .bind(item.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(CartItem::try_from).transpose()
    }

    async fn find_item_by_design(
        &self,
        user: UserId,
        design: &DesignRef,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM storefront.cart_item i
            JOIN storefront.cart c ON c.id = i.cart_id
            WHERE c.user_id = $1 AND i.design_ref = $2
            "
        );
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(user.as_i32())
            .bind(design.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(CartItem::try_from).transpose()
    }

    async fn insert_item(
        &self,
        user: UserId,
        item: &NewCartItem,
    ) -> Result<CartItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(user.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            r"
            INSERT INTO storefront.cart_item AS i
                (cart_id, design_ref, design_name, thumbnail, product_id, sizes, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(cart_id)
            .bind(item.design_ref.as_str())
            .bind(&item.design_name)
            .bind(item.thumbnail.as_deref())
            .bind(item.product_id.as_i32())
            .bind(encode_json(&item.sizes, "cart sizes")?)
            .bind(item.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "design already in cart"))?;

        tx.commit().await?;
        row.try_into()
    }

    async fn update_item(
        &self,
        user: UserId,
        item: CartItemId,
        sizes: &SizeQuantities,
        unit_price: Decimal,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefront.cart_item AS i
            SET sizes = $3, unit_price = $4, updated_at = NOW()
            FROM storefront.cart c
            WHERE c.id = i.cart_id AND c.user_id = $1 AND i.id = $2
            RETURNING {ITEM_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(user.as_i32())
            .bind(item.as_i32())
            .bind(encode_json(sizes, "cart sizes")?)
            .bind(unit_price)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CartItem::try_from).transpose()
    }

    async fn delete_item(&self, user: UserId, item: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_item i
            USING storefront.cart c
            WHERE c.id = i.cart_id AND c.user_id = $1 AND i.id = $2
            ",
        )
        .bind(user.as_i32())
        .bind(item.as_i32())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_item i
            USING storefront.cart c
            WHERE c.id = i.cart_id AND c.user_id = $1
            ",
        )
        .bind(user.as_i32())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
