//! Cart operations for guests and signed-in users.
//!
//! Guests keep their cart in the session ([`GuestCart`]); users keep theirs in
//! the database. [`CartService`] applies the same rules to both: quantities
//! accumulate per size, an emptied line disappears, and the unit price is
//! recomputed from the brand's tiers whenever the quantity changes.

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use model2design_core::{
    BrandId, CartItemId, DesignRef, FALLBACK_UNIT_PRICE, GUEST_PREFIX, ProductId, SizeQuantities,
    UserId, unit_price,
};

use crate::db::{CartRepository, CatalogRepository, RepositoryError};
use crate::models::{CartLineView, CartView, GuestCart, GuestCartLine, NewCartItem};

/// Errors from cart operations. Display strings are shown to the customer.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Quantity must be a positive number")]
    InvalidQuantity,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Invalid size selected")]
    InvalidSize,

    #[error("Item not found")]
    ItemNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Whose cart an operation works on.
#[derive(Debug)]
pub enum CartOwner<'c> {
    User(UserId),
    Guest(&'c mut GuestCart),
}

/// An add-to-cart request.
#[derive(Debug, Clone, Default)]
pub struct AddToCart {
    pub design_id: String,
    pub design_name: Option<String>,
    pub thumbnail: Option<String>,
    pub product_id: Option<ProductId>,
    pub size: String,
    pub quantity: Option<i64>,
}

/// Cart operations for one brand.
pub struct CartService<'a> {
    catalog: &'a dyn CatalogRepository,
    carts: &'a dyn CartRepository,
    brand: BrandId,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(
        catalog: &'a dyn CatalogRepository,
        carts: &'a dyn CartRepository,
        brand: BrandId,
    ) -> Self {
        Self {
            catalog,
            carts,
            brand,
        }
    }

    /// Unit price for `quantity` units of a product under this brand.
    ///
    /// A product the brand no longer offers is priced from its own tiers,
    /// and a missing product at the fallback price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog lookup fails.
    pub async fn price_for(
        &self,
        product: ProductId,
        quantity: u32,
    ) -> Result<Decimal, RepositoryError> {
        let quantity = i64::from(quantity);
        if let Some(offering) = self.catalog.offering(self.brand, product).await? {
            return Ok(offering.unit_price(quantity));
        }
        Ok(self
            .catalog
            .product(product)
            .await?
            .map_or(FALLBACK_UNIT_PRICE, |p| unit_price(&p.price_tiers, None, quantity)))
    }

    /// Add units of one size of a design.
    ///
    /// Returns the cart's new total quantity.
    ///
    /// # Errors
    ///
    /// Returns a validation `CartError` for missing fields, an unknown or
    /// unavailable product, or a size the product does not come in.
    pub async fn add(&self, owner: &mut CartOwner<'_>, request: AddToCart) -> Result<u32, CartError> {
        let design_ref = DesignRef::parse(&request.design_id).map_err(|_| CartError::MissingFields)?;
        let size = request.size.trim();
        if size.is_empty() {
            return Err(CartError::MissingFields);
        }
        let quantity = request.quantity.unwrap_or(1);
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(CartError::InvalidQuantity)?;

        let product_id = request.product_id.ok_or(CartError::ProductNotFound)?;
        let offering = self
            .catalog
            .offering(self.brand, product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        if !offering.product.has_size(size) {
            return Err(CartError::InvalidSize);
        }

        let design_name = request
            .design_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Design {design_ref}"));
        let thumbnail = request.thumbnail.filter(|t| !t.is_empty());

        match owner {
            CartOwner::Guest(cart) => {
                cart.add(GuestCartLine {
                    design_ref,
                    design_name,
                    thumbnail,
                    product_id,
                    sizes: SizeQuantities::single(size, quantity),
                    added_at: Utc::now(),
                });
                Ok(cart.total_quantity())
            }
            CartOwner::User(user) => {
                let user = *user;
                self.add_to_user_cart(
                    user,
                    NewCartItem {
                        design_ref,
                        design_name,
                        thumbnail,
                        product_id,
                        sizes: SizeQuantities::single(size, quantity),
                        unit_price: offering.unit_price(i64::from(quantity)),
                    },
                )
                .await?;
                self.count(&CartOwner::User(user)).await
            }
        }
    }

    /// Insert a line, or fold its sizes into the line already holding the design.
    async fn add_to_user_cart(&self, user: UserId, item: NewCartItem) -> Result<(), CartError> {
        if self.fold_into_existing(user, &item).await? {
            return Ok(());
        }
        match self.carts.insert_item(user, &item).await {
            Ok(_) => Ok(()),
            // Another request inserted the design first.
            Err(RepositoryError::Conflict(_)) => {
                self.fold_into_existing(user, &item).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fold_into_existing(&self, user: UserId, item: &NewCartItem) -> Result<bool, CartError> {
        let Some(existing) = self.carts.find_item_by_design(user, &item.design_ref).await? else {
            return Ok(false);
        };
        let mut sizes = existing.sizes.clone();
        sizes.merge(&item.sizes);
        let price = self.price_for(existing.product_id, sizes.total()).await?;
        self.carts
            .update_item(user, existing.id, &sizes, price)
            .await?;
        Ok(true)
    }

    /// Replace a line's size breakdown. Non-positive entries are dropped and
    /// an empty result removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the owner has no such line.
    pub async fn update_sizes(
        &self,
        owner: &mut CartOwner<'_>,
        item_id: &str,
        sizes: SizeQuantities,
    ) -> Result<(), CartError> {
        match owner {
            CartOwner::Guest(cart) => {
                let design = guest_item_ref(item_id)?;
                if cart.update_sizes(&design, sizes) {
                    Ok(())
                } else {
                    Err(CartError::ItemNotFound)
                }
            }
            CartOwner::User(user) => {
                let item = user_item_id(item_id)?;
                if sizes.is_empty() {
                    return if self.carts.delete_item(*user, item).await? {
                        Ok(())
                    } else {
                        Err(CartError::ItemNotFound)
                    };
                }
                let existing = self
                    .carts
                    .find_item(*user, item)
                    .await?
                    .ok_or(CartError::ItemNotFound)?;
                let price = self.price_for(existing.product_id, sizes.total()).await?;
                self.carts
                    .update_item(*user, item, &sizes, price)
                    .await?
                    .ok_or(CartError::ItemNotFound)?;
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the owner has no such line.
    pub async fn remove(&self, owner: &mut CartOwner<'_>, item_id: &str) -> Result<(), CartError> {
        let removed = match owner {
            CartOwner::Guest(cart) => cart.remove(&guest_item_ref(item_id)?),
            CartOwner::User(user) => self.carts.delete_item(*user, user_item_id(item_id)?).await?,
        };
        if removed {
            Ok(())
        } else {
            Err(CartError::ItemNotFound)
        }
    }

    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn clear(&self, owner: &mut CartOwner<'_>) -> Result<(), CartError> {
        match owner {
            CartOwner::Guest(cart) => cart.clear(),
            CartOwner::User(user) => {
                self.carts.clear(*user).await?;
            }
        }
        Ok(())
    }

    /// Total units in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn count(&self, owner: &CartOwner<'_>) -> Result<u32, CartError> {
        match owner {
            CartOwner::Guest(cart) => Ok(cart.total_quantity()),
            CartOwner::User(user) => Ok(self
                .carts
                .items(*user)
                .await?
                .iter()
                .fold(0_u32, |acc, item| acc.saturating_add(item.quantity()))),
        }
    }

    /// Price and total the cart. Lines whose product no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a lookup fails.
    pub async fn view(&self, owner: &CartOwner<'_>) -> Result<CartView, CartError> {
        let mut lines = Vec::new();
        match owner {
            CartOwner::Guest(cart) => {
                for line in cart.lines() {
                    let Some(product) = self.catalog.product(line.product_id).await? else {
                        continue;
                    };
                    let quantity = line.sizes.total();
                    let price = self.price_for(line.product_id, quantity).await?;
                    lines.push(CartLineView {
                        id: line.item_id(),
                        design_id: line.design_ref.clone(),
                        design_name: line.design_name.clone(),
                        thumbnail: line.thumbnail.clone(),
                        product_id: line.product_id,
                        sizes_display: line.sizes.display(&product.sizes),
                        product_name: product.name,
                        sizes: line.sizes.clone(),
                        quantity,
                        unit_price: price,
                        line_total: price * Decimal::from(quantity),
                    });
                }
            }
            CartOwner::User(user) => {
                for item in self.carts.items(*user).await? {
                    let Some(product) = self.catalog.product(item.product_id).await? else {
                        continue;
                    };
                    lines.push(CartLineView {
                        id: item.id.to_string(),
                        sizes_display: item.sizes.display(&product.sizes),
                        product_name: product.name,
                        quantity: item.quantity(),
                        line_total: item.line_total(),
                        unit_price: item.unit_price,
                        design_id: item.design_ref,
                        design_name: item.design_name,
                        thumbnail: item.thumbnail,
                        product_id: item.product_id,
                        sizes: item.sizes,
                    });
                }
            }
        }
        Ok(CartView::from_lines(lines))
    }

    /// Move guest lines into a user's cart.
    ///
    /// A line for a design the user already has is summed into it per size
    /// and repriced; any other line becomes a new item. Each line is merged
    /// on its own, and lines that fail are handed back in
    /// [`GuestCartMerge::unmerged`].
    pub async fn merge_guest_into_user(
        &self,
        user: UserId,
        lines: Vec<GuestCartLine>,
    ) -> GuestCartMerge {
        let mut outcome = GuestCartMerge::default();
        for line in lines {
            match self.merge_line(user, &line).await {
                Ok(()) => outcome.merged += 1,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        user_id = %user,
                        design = %line.design_ref,
                        "Failed to merge guest cart line"
                    );
                    outcome.unmerged.push(line);
                }
            }
        }
        outcome
    }

    async fn merge_line(&self, user: UserId, line: &GuestCartLine) -> Result<(), CartError> {
        let price = self.price_for(line.product_id, line.sizes.total()).await?;
        self.add_to_user_cart(
            user,
            NewCartItem {
                design_ref: line.design_ref.clone(),
                design_name: line.design_name.clone(),
                thumbnail: line.thumbnail.clone(),
                product_id: line.product_id,
                sizes: line.sizes.clone(),
                unit_price: price,
            },
        )
        .await
    }
}

/// Result of merging a guest cart into a user's cart.
#[derive(Debug, Default)]
pub struct GuestCartMerge {
    pub merged: usize,
    /// Lines left out of the user's cart.
    pub unmerged: Vec<GuestCartLine>,
}

fn guest_item_ref(item_id: &str) -> Result<DesignRef, CartError> {
    item_id
        .strip_prefix(GUEST_PREFIX)
        .and_then(|design| DesignRef::parse(design).ok())
        .ok_or(CartError::ItemNotFound)
}

fn user_item_id(item_id: &str) -> Result<CartItemId, CartError> {
    item_id.parse().map_err(|_| CartError::ItemNotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use model2design_core::PriceTiers;

    use std::sync::Arc;

    use super::*;
    use crate::db::memory::FailingCarts;
    use crate::db::{BrandRepository, MemoryStore};
    use crate::models::{BrandProduct, NewBrand, NewProduct};

    fn tiers(pairs: &[(u32, i64)]) -> PriceTiers {
        PriceTiers::from_pairs(pairs.iter().map(|&(q, p)| (q, Decimal::from(p)))).unwrap()
    }

    async fn setup(store: &MemoryStore) -> (BrandId, ProductId) {
        let brand = store.create(&NewBrand::default_brand()).await.unwrap();
        let product = store
            .upsert_product(&NewProduct::new(
                "Team Hoodie",
                &["S", "M", "L"],
                tiers(&[(1, 100), (5, 80), (10, 60)]),
            ))
            .await
            .unwrap();
        store
            .set_brand_product(&BrandProduct {
                brand_id: brand.id,
                product_id: product.id,
                is_available: true,
                custom_price_tiers: PriceTiers::default(),
            })
            .await
            .unwrap();
        (brand.id, product.id)
    }

    fn add(design: &str, product: ProductId, size: &str, quantity: i64) -> AddToCart {
        AddToCart {
            design_id: design.to_string(),
            product_id: Some(product),
            size: size.to_string(),
            quantity: Some(quantity),
            ..AddToCart::default()
        }
    }

    #[tokio::test]
    async fn test_user_add_accumulates_and_reprices() {
        let store = MemoryStore::default();
        let (brand, product) = setup(&store).await;
        let service = CartService::new(&store, &store, brand);
        let mut owner = CartOwner::User(UserId::new(7));

        service.add(&mut owner, add("12", product, "S", 2)).await.unwrap();
        let count = service.add(&mut owner, add("12", product, "M", 4)).await.unwrap();
        assert_eq!(count, 6);

        let view = service.view(&owner).await.unwrap();
        assert_eq!(view.items.len(), 1);
        let line = view.items.first().unwrap();
        assert_eq!(line.quantity, 6);
        assert_eq!(line.unit_price, Decimal::from(80));
        assert_eq!(line.design_name, "Design 12");
        assert_eq!(line.sizes_display, "2x S, 4x M");
        assert_eq!(view.total, Decimal::from(480 + 15));
    }

    #[tokio::test]
    async fn test_add_validation() {
        let store = MemoryStore::default();
        let (brand, product) = setup(&store).await;
        let service = CartService::new(&store, &store, brand);
        let mut cart = GuestCart::default();
        let mut owner = CartOwner::Guest(&mut cart);

        assert!(matches!(
            service.add(&mut owner, add("", product, "S", 1)).await,
            Err(CartError::MissingFields)
        ));
        assert!(matches!(
            service.add(&mut owner, add("12", product, "XXL", 1)).await,
            Err(CartError::InvalidSize)
        ));
        assert!(matches!(
            service.add(&mut owner, add("12", ProductId::new(999), "S", 1)).await,
            Err(CartError::ProductNotFound)
        ));
        assert!(matches!(
            service.add(&mut owner, add("12", product, "S", 0)).await,
            Err(CartError::InvalidQuantity)
        ));
    }

    #[tokio::test]
    async fn test_update_sizes_sets_quantity_and_empty_removes() {
        let store = MemoryStore::default();
        let (brand, product) = setup(&store).await;
        let service = CartService::new(&store, &store, brand);
        let mut owner = CartOwner::User(UserId::new(7));
        service.add(&mut owner, add("12", product, "S", 1)).await.unwrap();
        let item_id = service.view(&owner).await.unwrap().items.first().unwrap().id.clone();

        let sizes = SizeQuantities::from_signed([("S", 3_i64), ("M", 7), ("L", -2)]);
        service.update_sizes(&mut owner, &item_id, sizes).await.unwrap();
        let view = service.view(&owner).await.unwrap();
        let line = view.items.first().unwrap();
        assert_eq!(line.quantity, 10);
        assert_eq!(line.unit_price, Decimal::from(60));

        let zeroed = SizeQuantities::from_signed([("S", 0_i64)]);
        service.update_sizes(&mut owner, &item_id, zeroed).await.unwrap();
        assert!(service.view(&owner).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_items_are_scoped_to_their_user() {
        let store = MemoryStore::default();
        let (brand, product) = setup(&store).await;
        let service = CartService::new(&store, &store, brand);
        let mut alice = CartOwner::User(UserId::new(1));
        service.add(&mut alice, add("12", product, "S", 1)).await.unwrap();
        let item_id = service.view(&alice).await.unwrap().items.first().unwrap().id.clone();

        let mut bob = CartOwner::User(UserId::new(2));
        assert!(matches!(
            service.remove(&mut bob, &item_id).await,
            Err(CartError::ItemNotFound)
        ));
        assert!(matches!(
            service.remove(&mut bob, "guest_12").await,
            Err(CartError::ItemNotFound)
        ));
        assert_eq!(service.count(&alice).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_sums_sizes_and_reprices() {
        let store = MemoryStore::default();
        let (brand, product) = setup(&store).await;
        let service = CartService::new(&store, &store, brand);
        let user = UserId::new(7);
        let mut owner = CartOwner::User(user);
        service.add(&mut owner, add("A", product, "S", 1)).await.unwrap();

        let mut guest = GuestCart::default();
        service
            .add(&mut CartOwner::Guest(&mut guest), add("A", product, "S", 2))
            .await
            .unwrap();

        let outcome = service.merge_guest_into_user(user, guest.drain()).await;
        assert_eq!(outcome.merged, 1);
        assert!(outcome.unmerged.is_empty());

        let view = service.view(&owner).await.unwrap();
        let line = view.items.first().unwrap();
        assert_eq!(line.sizes.get("S"), Some(3));
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_merge_of_empty_guest_cart_is_noop() {
        let store = MemoryStore::default();
        let (brand, product) = setup(&store).await;
        let service = CartService::new(&store, &store, brand);
        let user = UserId::new(7);
        service
            .add(&mut CartOwner::User(user), add("A", product, "S", 1))
            .await
            .unwrap();

        assert_eq!(service.merge_guest_into_user(user, Vec::new()).await.merged, 0);
        assert_eq!(service.count(&CartOwner::User(user)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_keeps_going_past_a_failed_line() {
        let store = Arc::new(MemoryStore::default());
        let (brand, product) = setup(&store).await;
        let carts = FailingCarts {
            store: store.clone(),
            failing: DesignRef::parse("B").unwrap(),
        };
        let service = CartService::new(store.as_ref(), &carts, brand);
        let user = UserId::new(7);

        let mut guest = GuestCart::default();
        for design in ["A", "B", "C"] {
            service
                .add(&mut CartOwner::Guest(&mut guest), add(design, product, "S", 1))
                .await
                .unwrap();
        }

        let outcome = service.merge_guest_into_user(user, guest.drain()).await;
        assert_eq!(outcome.merged, 2);
        assert_eq!(outcome.unmerged.len(), 1);
        assert_eq!(outcome.unmerged.first().unwrap().design_ref, DesignRef::parse("B").unwrap());
        assert_eq!(service.count(&CartOwner::User(user)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_guest_view_skips_missing_products_and_prices_fallback() {
        let store = MemoryStore::default();
        let (brand, product) = setup(&store).await;
        let service = CartService::new(&store, &store, brand);
        let mut cart = GuestCart::default();
        service
            .add(&mut CartOwner::Guest(&mut cart), add("A", product, "S", 1))
            .await
            .unwrap();
        cart.add(GuestCartLine {
            design_ref: DesignRef::parse("B").unwrap(),
            design_name: "Gone".to_string(),
            thumbnail: None,
            product_id: ProductId::new(999),
            sizes: SizeQuantities::single("S", 1),
            added_at: Utc::now(),
        });

        let view = service.view(&CartOwner::Guest(&mut cart)).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items.first().unwrap().id, "guest_A");
        assert_eq!(
            service.price_for(ProductId::new(999), 3).await.unwrap(),
            FALLBACK_UNIT_PRICE
        );
    }
}
