//! Guest-to-user migration.
//!
//! When a guest signs in or registers, their session cart is merged into the
//! user's cart and their designs and images are handed to the account. Each
//! step is independent: a failure is logged and the rest still run, and
//! nothing here can fail the login itself. Cart lines that could not be
//! merged stay in the guest cart.

use serde::Serialize;

use model2design_core::{BrandId, GuestId, UserId};

use crate::db::Repositories;
use crate::models::GuestCart;
use crate::models::design::dedupe_name;
use crate::services::cart::CartService;

/// What was moved to the account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub cart_items: usize,
    pub designs: usize,
    pub images: u64,
}

impl MigrationReport {
    #[must_use]
    pub fn total(&self) -> u64 {
        let moved = self.cart_items.saturating_add(self.designs);
        u64::try_from(moved)
            .unwrap_or(u64::MAX)
            .saturating_add(self.images)
    }
}

/// Moves a guest's data to a user.
pub struct GuestMigration<'a> {
    repos: &'a Repositories,
    brand: BrandId,
}

impl<'a> GuestMigration<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories, brand: BrandId) -> Self {
        Self { repos, brand }
    }

    /// Merge `cart` into the user's cart and re-own the guest's designs and images.
    ///
    /// On return `cart` holds only the lines that failed to merge.
    pub async fn run(
        &self,
        user: UserId,
        cart: &mut GuestCart,
        guest: Option<GuestId>,
    ) -> MigrationReport {
        let mut report = MigrationReport::default();

        if !cart.is_empty() {
            let carts = CartService::new(
                self.repos.catalog.as_ref(),
                self.repos.carts.as_ref(),
                self.brand,
            );
            let outcome = carts.merge_guest_into_user(user, cart.drain()).await;
            report.cart_items = outcome.merged;
            if !outcome.unmerged.is_empty() {
                tracing::error!(
                    user_id = %user,
                    unmerged = outcome.unmerged.len(),
                    "Guest cart lines kept in the session"
                );
                for line in outcome.unmerged {
                    cart.add(line);
                }
            }
        }

        if let Some(guest) = guest {
            report.designs = self.transfer_designs(guest, user).await;
            match self.repos.images.reassign_guest(guest, user).await {
                Ok(moved) => report.images = moved,
                Err(e) => {
                    tracing::error!(error = %e, user_id = %user, "Failed to migrate guest images");
                }
            }
        }

        if report.total() > 0 {
            tracing::info!(
                user_id = %user,
                cart_items = report.cart_items,
                designs = report.designs,
                images = report.images,
                "Migrated guest data"
            );
        }
        report
    }

    /// Give each guest design to the user, renaming it when the user already
    /// has a design of that name in the same brand.
    async fn transfer_designs(&self, guest: GuestId, user: UserId) -> usize {
        let designs = match self.repos.designs.guest_designs(guest).await {
            Ok(designs) => designs,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user, "Failed to load guest designs");
                return 0;
            }
        };

        let mut moved = 0;
        for design in designs {
            let taken = match self.repos.designs.names(user, design.brand_id).await {
                Ok(names) => names,
                Err(e) => {
                    tracing::error!(error = %e, design_id = %design.id, "Failed to migrate guest design");
                    continue;
                }
            };
            let name = dedupe_name(&design.name, |candidate| taken.iter().any(|n| n == candidate));
            match self
                .repos
                .designs
                .transfer_to_user(design.id, guest, user, &name)
                .await
            {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, design_id = %design.id, "Failed to migrate guest design");
                }
            }
        }
        moved
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use model2design_core::{DesignRef, Owner, PriceTiers, ProductId, SizeQuantities};

    use super::*;
    use crate::db::memory::FailingCarts;
    use crate::db::{
        BrandRepository, CartRepository, CatalogRepository, DesignRepository, ImageRepository,
        MemoryStore,
    };
    use crate::models::{
        BrandProduct, GuestCartLine, NewBrand, NewDesign, NewDesignImage, NewProduct, Thumbnails,
    };

    fn line(design: &str, product: ProductId) -> GuestCartLine {
        GuestCartLine {
            design_ref: DesignRef::parse(design).unwrap(),
            design_name: "Crest".to_string(),
            thumbnail: None,
            product_id: product,
            sizes: SizeQuantities::single("One Size", 2),
            added_at: Utc::now(),
        }
    }

    fn design(owner: Owner, brand: BrandId, name: &str) -> NewDesign {
        NewDesign {
            owner,
            brand_id: brand,
            name: name.to_string(),
            product_id: ProductId::new(1),
            data: json!({}),
            thumbnails: Thumbnails::default(),
            public: false,
        }
    }

    #[tokio::test]
    async fn test_migrates_cart_designs_and_images() {
        let store = Arc::new(MemoryStore::default());
        let repos = Repositories::from_memory(&store);
        let brand = BrandRepository::create(store.as_ref(), &NewBrand::default_brand())
            .await
            .unwrap();
        let product = store
            .upsert_product(&NewProduct::new(
                "Mug",
                &["One Size"],
                PriceTiers::from_pairs([(1, Decimal::from(12))]).unwrap(),
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

        let user = UserId::new(50);
        let guest = GuestId::generate();
        DesignRepository::insert(store.as_ref(), &design(Owner::User(user), brand.id, "Crest"))
            .await
            .unwrap();
        DesignRepository::insert(store.as_ref(), &design(Owner::Guest(guest), brand.id, "Crest"))
            .await
            .unwrap();
        ImageRepository::insert(
            store.as_ref(),
            &NewDesignImage {
                owner: Owner::Guest(guest),
                name: "logo".to_string(),
                url: "/media/design_images/logo.png".to_string(),
                width: 10,
                height: 10,
                file_size: 100,
                content_type: "image/png".to_string(),
            },
        )
        .await
        .unwrap();

        let mut cart = GuestCart::default();
        cart.add(line("guest_1", product.id));

        let report = GuestMigration::new(&repos, brand.id)
            .run(user, &mut cart, Some(guest))
            .await;
        assert!(cart.is_empty());
        assert_eq!(
            report,
            MigrationReport {
                cart_items: 1,
                designs: 1,
                images: 1
            }
        );

        let mut names = store.names(user, brand.id).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["Crest", "Crest (2)"]);
        assert!(store.guest_designs(guest).await.unwrap().is_empty());
        assert_eq!(ImageRepository::list(store.as_ref(), Owner::User(user)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_to_migrate() {
        let repos = Repositories::in_memory();
        let report = GuestMigration::new(&repos, BrandId::new(1))
            .run(UserId::new(1), &mut GuestCart::default(), None)
            .await;
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn test_failed_cart_lines_stay_in_guest_cart() {
        let store = Arc::new(MemoryStore::default());
        let mut repos = Repositories::from_memory(&store);
        repos.carts = Arc::new(FailingCarts {
            store: store.clone(),
            failing: DesignRef::parse("guest_2").unwrap(),
        });
        let user = UserId::new(50);

        let mut cart = GuestCart::default();
        for design in ["guest_1", "guest_2", "guest_3"] {
            cart.add(line(design, ProductId::new(1)));
        }

        let report = GuestMigration::new(&repos, BrandId::new(1))
            .run(user, &mut cart, None)
            .await;
        assert_eq!(report.cart_items, 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines().first().unwrap().design_ref.as_str(), "guest_2");
        assert_eq!(CartRepository::items(store.as_ref(), user).await.unwrap().len(), 2);
    }
}
