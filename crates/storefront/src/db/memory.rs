//! In-memory implementation of every repository trait.
//!
//! Used by the integration tests and by local development with
//! `STOREFRONT_DATABASE_URL=memory`. It enforces the same unique constraints
//! and owner scoping as the `PostgreSQL` schema so both behave alike.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use model2design_core::{
    BrandId, BrandImageCategoryId, BrandImageId, BrandTemplateId, CartId, CartItemId, DesignId,
    DesignImageId, DesignRef, DesignTemplateId, Email, FaqId, GuestId, Owner, PasswordResetTokenId,
    ProductId, SizeQuantities, SupportSubmissionId, TutorialId, UserId, slugify,
};

use super::{
    BrandRepository, CartRepository, CatalogRepository, DesignRepository, ImageRepository,
    RepositoryError, SupportRepository, TemplateRepository, UserRepository,
};
use crate::models::{
    Brand, BrandImage, BrandImageCategory, BrandProduct, BrandTemplate, CartItem,
    DESIGNS_PER_PAGE, Design, DesignImage, DesignListQuery, DesignStats, DesignTemplate,
    DesignUpdate, Faq, NewBrand, NewBrandImage, NewBrandTemplate, NewCartItem, NewDesign,
    NewDesignImage, NewDesignTemplate, NewProduct, NewSupportSubmission, NewUser, Offering,
    PasswordResetToken, Product, ProfileUpdate, SupportSubmission, Tutorial, User,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    brands: Vec<Brand>,
    products: Vec<Product>,
    brand_products: Vec<BrandProduct>,
    users: Vec<(User, String)>,
    reset_tokens: Vec<PasswordResetToken>,
    carts: HashMap<UserId, CartId>,
    cart_items: Vec<(UserId, CartItem)>,
    designs: Vec<Design>,
    images: Vec<DesignImage>,
    submissions: Vec<SupportSubmission>,
    faqs: Vec<(Faq, bool)>,
    tutorials: Vec<(Tutorial, bool)>,
    design_templates: Vec<DesignTemplate>,
    brand_image_categories: Vec<BrandImageCategory>,
    brand_images: Vec<BrandImage>,
    /// Templates with their owning brand and `is_public` flag.
    brand_templates: Vec<(BrandId, bool, BrandTemplate)>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn offering(&self, brand: BrandId, product: &Product) -> Option<Offering> {
        if !product.can_order {
            return None;
        }
        self.brand_products
            .iter()
            .find(|bp| bp.brand_id == brand && bp.product_id == product.id && bp.is_available)
            .map(|bp| Offering {
                product: product.clone(),
                custom_price_tiers: bp.custom_price_tiers.clone(),
            })
    }

    fn design_name_taken(&self, user: UserId, brand: BrandId, name: &str, except: Option<DesignId>) -> bool {
        self.designs.iter().any(|d| {
            d.owner == Owner::User(user)
                && d.brand_id == brand
                && d.name == name
                && Some(d.id) != except
        })
    }
}

/// Shared in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Add an FAQ entry.
    pub fn add_faq(&self, question: &str, answer: &str, position: i32, is_active: bool) -> Faq {
        let mut t = self.tables.lock();
        let faq = Faq {
            id: FaqId::new(t.next_id()),
            question: question.to_owned(),
            answer: answer.to_owned(),
            position,
        };
        t.faqs.push((faq.clone(), is_active));
        faq
    }

    /// Add a tutorial.
    pub fn add_tutorial(&self, title: &str, slug: &str, content: &str, position: i32, is_active: bool) -> Tutorial {
        let mut t = self.tables.lock();
        let tutorial = Tutorial {
            id: TutorialId::new(t.next_id()),
            title: title.to_owned(),
            slug: slug.to_owned(),
            description: String::new(),
            content: content.to_owned(),
            position,
        };
        t.tutorials.push((tutorial.clone(), is_active));
        tutorial
    }

    /// Add a design template.
    pub fn add_design_template(&self, template: &NewDesignTemplate) -> DesignTemplate {
        let mut t = self.tables.lock();
        let now = Utc::now();
        let stored = DesignTemplate {
            id: DesignTemplateId::new(t.next_id()),
            brand_id: template.brand_id,
            name: template.name.clone(),
            description: template.description.clone(),
            product_id: template.product_id,
            data: template.data.clone(),
            thumbnails: template.thumbnails.clone(),
            is_active: template.is_active,
            sort_order: template.sort_order,
            created_at: now,
            updated_at: now,
        };
        t.design_templates.push(stored.clone());
        stored
    }

    /// Add a brand image category; the slug is derived from the name.
    pub fn add_brand_image_category(&self, brand: BrandId, name: &str) -> BrandImageCategory {
        let mut t = self.tables.lock();
        let category = BrandImageCategory {
            id: BrandImageCategoryId::new(t.next_id()),
            brand_id: brand,
            name: name.to_owned(),
            slug: slugify(name),
        };
        t.brand_image_categories.push(category.clone());
        category
    }

    /// Add an image to a brand's library.
    pub fn add_brand_image(&self, image: &NewBrandImage) -> BrandImage {
        let mut t = self.tables.lock();
        let stored = BrandImage {
            id: BrandImageId::new(t.next_id()),
            brand_id: image.brand_id,
            category_id: image.category_id,
            name: image.name.clone(),
            image_url: image.image_url.clone(),
            thumbnail_url: image.thumbnail_url.clone(),
            width: image.width,
            height: image.height,
            file_size: image.file_size,
            created_at: Utc::now(),
        };
        t.brand_images.push(stored.clone());
        stored
    }

    /// Add a brand template.
    pub fn add_brand_template(&self, template: &NewBrandTemplate) -> BrandTemplateId {
        let mut t = self.tables.lock();
        let id = BrandTemplateId::new(t.next_id());
        let brand_name = t
            .brands
            .iter()
            .find(|b| b.id == template.brand_id)
            .map(|b| b.name.clone())
            .unwrap_or_default();
        let stored = BrandTemplate {
            id,
            name: template.name.clone(),
            brand_name,
            thumbnail_url: template.thumbnail_url.clone(),
            usage_count: template.usage_count,
            is_featured: template.is_featured,
        };
        t.brand_templates.push((template.brand_id, template.is_public, stored));
        id
    }

    /// Every support submission, oldest first.
    #[must_use]
    pub fn submissions(&self) -> Vec<SupportSubmission> {
        self.tables.lock().submissions.clone()
    }

    /// Every password reset token, oldest first.
    #[must_use]
    pub fn reset_tokens(&self) -> Vec<PasswordResetToken> {
        self.tables.lock().reset_tokens.clone()
    }

    /// Every stored design.
    #[must_use]
    pub fn designs(&self) -> Vec<Design> {
        self.tables.lock().designs.clone()
    }

    /// Every stored brand.
    #[must_use]
    pub fn brands(&self) -> Vec<Brand> {
        self.tables.lock().brands.clone()
    }

    /// Age a reset token, for expiry tests.
    pub fn backdate_reset_token(&self, token: &str, by: Duration) {
        let mut t = self.tables.lock();
        if let Some(stored) = t.reset_tokens.iter_mut().find(|r| r.token == token) {
            stored.created_at -= by;
        }
    }
}

#[async_trait]
impl BrandRepository for MemoryStore {
    async fn find_active_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<Brand>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.brands
            .iter()
            .find(|b| b.is_active && b.subdomain.as_deref() == Some(subdomain))
            .cloned())
    }

    async fn find_default(&self) -> Result<Option<Brand>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.brands.iter().find(|b| b.is_default && b.is_active).cloned())
    }

    async fn get(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.brands.iter().find(|b| b.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Brand>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.brands.iter().find(|b| b.slug == slug).cloned())
    }

    async fn demote_inactive_default(&self) -> Result<u64, RepositoryError> {
        let mut t = self.tables.lock();
        let now = Utc::now();
        let mut demoted = 0;
        for brand in t.brands.iter_mut().filter(|b| b.is_default && !b.is_active) {
            brand.is_default = false;
            brand.updated_at = now;
            demoted += 1;
        }
        Ok(demoted)
    }

    async fn create(&self, brand: &NewBrand) -> Result<Brand, RepositoryError> {
        let mut t = self.tables.lock();
        let clash = t.brands.iter().any(|b| {
            b.slug == brand.slug
                || (brand.subdomain.is_some() && b.subdomain == brand.subdomain)
                || (brand.is_default && b.is_default)
        });
        if clash {
            return Err(RepositoryError::Conflict(
                "brand slug, subdomain, or default already exists".to_owned(),
            ));
        }
        let now = Utc::now();
        let created = Brand {
            id: BrandId::new(t.next_id()),
            name: brand.name.clone(),
            slug: brand.slug.clone(),
            subdomain: brand.subdomain.clone(),
            headline: brand.headline.clone(),
            description: brand.description.clone(),
            logo_url: brand.logo_url.clone(),
            primary_color: brand.primary_color.clone(),
            secondary_color: brand.secondary_color.clone(),
            contact_email: brand.contact_email.clone(),
            website_url: brand.website_url.clone(),
            is_default: brand.is_default,
            is_active: brand.is_active,
            created_at: now,
            updated_at: now,
        };
        t.brands.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_offerings(
        &self,
        brand: BrandId,
        category: Option<&str>,
    ) -> Result<Vec<Offering>, RepositoryError> {
        let t = self.tables.lock();
        let mut offerings: Vec<Offering> = t
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.categories.iter().any(|pc| pc == c)))
            .filter_map(|p| t.offering(brand, p))
            .collect();
        offerings.sort_by(|a, b| {
            (&a.product.name, a.product.id).cmp(&(&b.product.name, b.product.id))
        });
        Ok(offerings)
    }

    async fn offering(
        &self,
        brand: BrandId,
        product: ProductId,
    ) -> Result<Option<Offering>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.products
            .iter()
            .find(|p| p.id == product)
            .and_then(|p| t.offering(brand, p)))
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.products.iter().find(|p| p.id == id).cloned())
    }

    async fn upsert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut t = self.tables.lock();
        let now = Utc::now();
        let existing = t.products.iter().position(|p| p.slug == product.slug);
        let previous = existing
            .and_then(|i| t.products.get(i))
            .map(|p| (p.id, p.created_at));
        let (id, created_at) = match previous {
            Some(found) => found,
            None => (ProductId::new(t.next_id()), now),
        };
        let stored = Product {
            id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            model_url: product.model_url.clone(),
            thumbnail_url: product.thumbnail_url.clone(),
            categories: product.categories.clone(),
            sizes: product.sizes.clone(),
            price_tiers: product.price_tiers.clone(),
            details: product.details.clone(),
            initial_layer: product.initial_layer.clone(),
            initial_bumpmap: product.initial_bumpmap.clone(),
            supported_bumpmaps: product.supported_bumpmaps.clone(),
            can_order: product.can_order,
            created_at,
            updated_at: now,
        };
        match existing.and_then(|i| t.products.get_mut(i)) {
            Some(slot) => *slot = stored.clone(),
            None => t.products.push(stored.clone()),
        }
        Ok(stored)
    }

    async fn set_brand_product(&self, listing: &BrandProduct) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock();
        let known = t.brands.iter().any(|b| b.id == listing.brand_id)
            && t.products.iter().any(|p| p.id == listing.product_id);
        if !known {
            return Err(RepositoryError::NotFound);
        }
        t.brand_products
            .retain(|bp| !(bp.brand_id == listing.brand_id && bp.product_id == listing.product_id));
        t.brand_products.push(listing.clone());
        Ok(())
    }

    async fn assign_unowned_to_brand(&self, brand: BrandId) -> Result<u64, RepositoryError> {
        let mut t = self.tables.lock();
        let listed: HashSet<ProductId> = t.brand_products.iter().map(|bp| bp.product_id).collect();
        let unowned: Vec<ProductId> = t
            .products
            .iter()
            .filter(|p| p.can_order && !listed.contains(&p.id))
            .map(|p| p.id)
            .collect();
        for product_id in &unowned {
            t.brand_products.push(BrandProduct {
                brand_id: brand,
                product_id: *product_id,
                is_available: true,
                custom_price_tiers: model2design_core::PriceTiers::default(),
            });
        }
        Ok(unowned.len() as u64)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let t = self.tables.lock();
        let mut items: Vec<CartItem> = t
            .cart_items
            .iter()
            .filter(|(owner, _)| *owner == user)
            .map(|(_, item)| item.clone())
            .collect();
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(items)
    }

    async fn find_item(
        &self,
        user: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.cart_items
            .iter()
            .find(|(owner, i)| *owner == user && i.id == item)
            .map(|(_, i)| i.clone()))
    }

    async fn find_item_by_design(
        &self,
        user: UserId,
        design: &DesignRef,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.cart_items
            .iter()
            .find(|(owner, i)| *owner == user && &i.design_ref == design)
            .map(|(_, i)| i.clone()))
    }

    async fn insert_item(
        &self,
        user: UserId,
        item: &NewCartItem,
    ) -> Result<CartItem, RepositoryError> {
        let mut t = self.tables.lock();
        if t
            .cart_items
            .iter()
            .any(|(owner, i)| *owner == user && i.design_ref == item.design_ref)
        {
            return Err(RepositoryError::Conflict("design already in cart".to_owned()));
        }
        let cart_id = match t.carts.get(&user) {
            Some(id) => *id,
            None => {
                let id = CartId::new(t.next_id());
                t.carts.insert(user, id);
                id
            }
        };
        let now = Utc::now();
        let stored = CartItem {
            id: CartItemId::new(t.next_id()),
            cart_id,
            design_ref: item.design_ref.clone(),
            design_name: item.design_name.clone(),
            thumbnail: item.thumbnail.clone(),
            product_id: item.product_id,
            sizes: item.sizes.clone(),
            unit_price: item.unit_price,
            created_at: now,
            updated_at: now,
        };
        t.cart_items.push((user, stored.clone()));
        Ok(stored)
    }

    async fn update_item(
        &self,
        user: UserId,
        item: CartItemId,
        sizes: &SizeQuantities,
        unit_price: Decimal,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut t = self.tables.lock();
        Ok(t.cart_items
            .iter_mut()
            .find(|(owner, i)| *owner == user && i.id == item)
            .map(|(_, i)| {
                i.sizes = sizes.clone();
                i.unit_price = unit_price;
                i.updated_at = Utc::now();
                i.clone()
            }))
    }

    async fn delete_item(&self, user: UserId, item: CartItemId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock();
        let before = t.cart_items.len();
        t.cart_items.retain(|(owner, i)| !(*owner == user && i.id == item));
        Ok(t.cart_items.len() != before)
    }

    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut t = self.tables.lock();
        let before = t.cart_items.len();
        t.cart_items.retain(|(owner, _)| *owner != user);
        Ok((before - t.cart_items.len()) as u64)
    }
}

#[async_trait]
impl DesignRepository for MemoryStore {
    async fn insert(&self, design: &NewDesign) -> Result<Design, RepositoryError> {
        let mut t = self.tables.lock();
        if let Owner::User(user) = design.owner
            && t.design_name_taken(user, design.brand_id, &design.name, None)
        {
            return Err(RepositoryError::Conflict("design name already exists".to_owned()));
        }
        let now = Utc::now();
        let stored = Design {
            id: DesignId::new(t.next_id()),
            owner: design.owner,
            brand_id: design.brand_id,
            name: design.name.clone(),
            product_id: design.product_id,
            data: design.data.clone(),
            thumbnails: design.thumbnails.clone(),
            public: design.public,
            created_at: now,
            updated_at: now,
        };
        t.designs.push(stored.clone());
        Ok(stored)
    }

    async fn find_owned(
        &self,
        id: DesignId,
        owner: Owner,
    ) -> Result<Option<Design>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.designs
            .iter()
            .find(|d| d.id == id && d.owner == owner)
            .cloned())
    }

    async fn find_public(&self, id: DesignId) -> Result<Option<Design>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.designs.iter().find(|d| d.id == id && d.public).cloned())
    }

    async fn update(
        &self,
        id: DesignId,
        owner: Owner,
        update: &DesignUpdate,
    ) -> Result<Option<Design>, RepositoryError> {
        let mut t = self.tables.lock();
        if !t.designs.iter().any(|d| d.id == id && d.owner == owner) {
            return Ok(None);
        }
        if let Owner::User(user) = owner
            && t.design_name_taken(user, update.brand_id, &update.name, Some(id))
        {
            return Err(RepositoryError::Conflict("design name already exists".to_owned()));
        }
        Ok(t.designs
            .iter_mut()
            .find(|d| d.id == id && d.owner == owner)
            .map(|d| {
                d.brand_id = update.brand_id;
                d.name.clone_from(&update.name);
                d.product_id = update.product_id;
                d.data = update.data.clone();
                d.thumbnails.apply(update.thumbnails.clone());
                d.public = update.public;
                d.updated_at = Utc::now();
                d.clone()
            }))
    }

    async fn set_visibility(
        &self,
        id: DesignId,
        owner: Owner,
        public: bool,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock();
        Ok(t.designs
            .iter_mut()
            .find(|d| d.id == id && d.owner == owner)
            .map(|d| {
                d.public = public;
                d.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete(&self, id: DesignId, owner: Owner) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock();
        let before = t.designs.len();
        t.designs.retain(|d| !(d.id == id && d.owner == owner));
        Ok(t.designs.len() != before)
    }

    async fn count_matching(
        &self,
        owner: Owner,
        brand: BrandId,
        search: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let query = DesignListQuery {
            search: search.map(str::to_owned),
            ..DesignListQuery::default()
        };
        let t = self.tables.lock();
        let count = t
            .designs
            .iter()
            .filter(|d| d.owner == owner && d.brand_id == brand && query.matches(&d.name))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn list(
        &self,
        owner: Owner,
        brand: BrandId,
        query: &DesignListQuery,
    ) -> Result<Vec<Design>, RepositoryError> {
        let t = self.tables.lock();
        let mut designs: Vec<Design> = t
            .designs
            .iter()
            .filter(|d| d.owner == owner && d.brand_id == brand && query.matches(&d.name))
            .cloned()
            .collect();
        query.order.sort(&mut designs);
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        Ok(designs
            .into_iter()
            .skip(offset)
            .take(DESIGNS_PER_PAGE as usize)
            .collect())
    }

    async fn stats(&self, owner: Owner, brand: BrandId) -> Result<DesignStats, RepositoryError> {
        let t = self.tables.lock();
        let week_ago = Utc::now() - Duration::days(7);
        let owned: Vec<&Design> = t
            .designs
            .iter()
            .filter(|d| d.owner == owner && d.brand_id == brand)
            .collect();
        let products: HashSet<ProductId> = owned.iter().map(|d| d.product_id).collect();
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(DesignStats {
            total_designs: count(owned.len()),
            recent_designs: count(owned.iter().filter(|d| d.created_at >= week_ago).count()),
            products_designed: count(products.len()),
        })
    }

    async fn names(&self, user: UserId, brand: BrandId) -> Result<Vec<String>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.designs
            .iter()
            .filter(|d| d.owner == Owner::User(user) && d.brand_id == brand)
            .map(|d| d.name.clone())
            .collect())
    }

    async fn count_for_user(&self, user: UserId) -> Result<i64, RepositoryError> {
        let t = self.tables.lock();
        let count = t
            .designs
            .iter()
            .filter(|d| d.owner == Owner::User(user))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn guest_designs(&self, guest: GuestId) -> Result<Vec<Design>, RepositoryError> {
        let t = self.tables.lock();
        let mut designs: Vec<Design> = t
            .designs
            .iter()
            .filter(|d| d.owner == Owner::Guest(guest))
            .cloned()
            .collect();
        designs.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(designs)
    }

    async fn transfer_to_user(
        &self,
        id: DesignId,
        guest: GuestId,
        user: UserId,
        name: &str,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock();
        let Some(brand) = t
            .designs
            .iter()
            .find(|d| d.id == id && d.owner == Owner::Guest(guest))
            .map(|d| d.brand_id)
        else {
            return Ok(false);
        };
        if t.design_name_taken(user, brand, name, Some(id)) {
            return Err(RepositoryError::Conflict("design name already exists".to_owned()));
        }
        if let Some(design) = t.designs.iter_mut().find(|d| d.id == id) {
            design.owner = Owner::User(user);
            name.clone_into(&mut design.name);
            design.updated_at = Utc::now();
        }
        Ok(true)
    }
}

#[async_trait]
impl ImageRepository for MemoryStore {
    async fn insert(&self, image: &NewDesignImage) -> Result<DesignImage, RepositoryError> {
        let mut t = self.tables.lock();
        let stored = DesignImage {
            id: DesignImageId::new(t.next_id()),
            owner: image.owner,
            name: image.name.clone(),
            url: image.url.clone(),
            width: image.width,
            height: image.height,
            file_size: image.file_size,
            content_type: image.content_type.clone(),
            created_at: Utc::now(),
        };
        t.images.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, owner: Owner) -> Result<Vec<DesignImage>, RepositoryError> {
        let t = self.tables.lock();
        let mut images: Vec<DesignImage> = t
            .images
            .iter()
            .filter(|i| i.owner == owner)
            .cloned()
            .collect();
        images.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(images)
    }

    async fn delete(
        &self,
        id: DesignImageId,
        owner: Owner,
    ) -> Result<Option<DesignImage>, RepositoryError> {
        let mut t = self.tables.lock();
        let position = t.images.iter().position(|i| i.id == id && i.owner == owner);
        Ok(position.map(|p| t.images.remove(p)))
    }

    async fn reassign_guest(&self, guest: GuestId, user: UserId) -> Result<u64, RepositoryError> {
        let mut t = self.tables.lock();
        let mut moved = 0;
        for image in t.images.iter_mut().filter(|i| i.owner == Owner::Guest(guest)) {
            image.owner = Owner::User(user);
            moved += 1;
        }
        Ok(moved)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock();
        if t.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = Utc::now();
        let stored = User {
            id: UserId::new(t.next_id()),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            created_at: now,
            updated_at: now,
        };
        t.users.push((stored.clone(), user.password_hash.clone()));
        Ok(stored)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.users
            .iter()
            .find(|(u, _)| &u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.users.iter().find(|(u, _)| &u.email == email).cloned())
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.users.iter().find(|(u, _)| u.id == id).map(|(_, h)| h.clone()))
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut t = self.tables.lock();
        if t.users.iter().any(|(u, _)| u.email == update.email && u.id != id) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        Ok(t.users.iter_mut().find(|(u, _)| u.id == id).map(|(u, _)| {
            u.full_name.clone_from(&update.full_name);
            u.email = update.email.clone();
            u.phone = update.phone.clone();
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock();
        Ok(t.users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .map(|(_, hash)| password_hash.clone_into(hash))
            .is_some())
    }

    async fn create_reset_token(
        &self,
        user: UserId,
        token: &str,
    ) -> Result<PasswordResetToken, RepositoryError> {
        let mut t = self.tables.lock();
        if t.reset_tokens.iter().any(|r| r.token == token) {
            return Err(RepositoryError::Conflict("reset token collision".to_owned()));
        }
        let stored = PasswordResetToken {
            id: PasswordResetTokenId::new(t.next_id()),
            user_id: user,
            token: token.to_owned(),
            created_at: Utc::now(),
            used: false,
        };
        t.reset_tokens.push(stored.clone());
        Ok(stored)
    }

    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.reset_tokens.iter().find(|r| r.token == token).cloned())
    }

    async fn mark_reset_token_used(
        &self,
        id: PasswordResetTokenId,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock();
        Ok(t.reset_tokens
            .iter_mut()
            .find(|r| r.id == id && !r.used)
            .map(|r| r.used = true)
            .is_some())
    }
}

#[async_trait]
impl SupportRepository for MemoryStore {
    async fn create(
        &self,
        submission: &NewSupportSubmission,
    ) -> Result<SupportSubmission, RepositoryError> {
        let mut t = self.tables.lock();
        let stored = SupportSubmission {
            id: SupportSubmissionId::new(t.next_id()),
            user_id: submission.user_id,
            category: submission.category,
            name: submission.name.clone(),
            email: submission.email.clone(),
            subject: submission.subject.clone(),
            message: submission.message.clone(),
            additional_data: submission.additional_data.clone(),
            is_resolved: false,
            created_at: Utc::now(),
        };
        t.submissions.push(stored.clone());
        Ok(stored)
    }

    async fn get(
        &self,
        id: SupportSubmissionId,
    ) -> Result<Option<SupportSubmission>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn resolve(&self, id: SupportSubmissionId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock();
        Ok(t.submissions
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| s.is_resolved = true)
            .is_some())
    }

    async fn active_faqs(&self) -> Result<Vec<Faq>, RepositoryError> {
        let t = self.tables.lock();
        let mut faqs: Vec<Faq> = t
            .faqs
            .iter()
            .filter(|(_, active)| *active)
            .map(|(f, _)| f.clone())
            .collect();
        faqs.sort_by_key(|f| (f.position, f.id));
        Ok(faqs)
    }

    async fn active_tutorials(&self) -> Result<Vec<Tutorial>, RepositoryError> {
        let t = self.tables.lock();
        let mut tutorials: Vec<Tutorial> = t
            .tutorials
            .iter()
            .filter(|(_, active)| *active)
            .map(|(tu, _)| tu.clone())
            .collect();
        tutorials.sort_by_key(|tu| (tu.position, tu.id));
        Ok(tutorials)
    }

    async fn tutorial_by_slug(&self, slug: &str) -> Result<Option<Tutorial>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.tutorials
            .iter()
            .find(|(tu, active)| *active && tu.slug == slug)
            .map(|(tu, _)| tu.clone()))
    }
}

#[async_trait]
impl TemplateRepository for MemoryStore {
    async fn active_design_templates(
        &self,
        brand: BrandId,
    ) -> Result<Vec<DesignTemplate>, RepositoryError> {
        let t = self.tables.lock();
        let mut templates: Vec<DesignTemplate> = t
            .design_templates
            .iter()
            .filter(|d| d.brand_id == brand && d.is_active)
            .cloned()
            .collect();
        templates.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
        });
        Ok(templates)
    }

    async fn active_design_template(
        &self,
        id: DesignTemplateId,
        brand: BrandId,
    ) -> Result<Option<DesignTemplate>, RepositoryError> {
        let t = self.tables.lock();
        Ok(t.design_templates
            .iter()
            .find(|d| d.id == id && d.brand_id == brand && d.is_active)
            .cloned())
    }

    async fn brand_images(&self, brand: BrandId) -> Result<Vec<BrandImage>, RepositoryError> {
        let t = self.tables.lock();
        let mut images: Vec<BrandImage> = t
            .brand_images
            .iter()
            .filter(|i| i.brand_id == brand)
            .cloned()
            .collect();
        images.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(images)
    }

    async fn public_brand_templates(&self) -> Result<Vec<BrandTemplate>, RepositoryError> {
        let t = self.tables.lock();
        let active = |brand: BrandId| t.brands.iter().any(|b| b.id == brand && b.is_active);
        let mut templates: Vec<BrandTemplate> = t
            .brand_templates
            .iter()
            .filter(|(brand, public, _)| *public && active(*brand))
            .map(|(_, _, template)| template.clone())
            .collect();
        templates.sort_by(|a, b| {
            (b.is_featured, b.usage_count)
                .cmp(&(a.is_featured, a.usage_count))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(templates)
    }
}

/// Carts backed by a [`MemoryStore`] whose lookups fail for one design.
#[cfg(test)]
pub(crate) struct FailingCarts {
    pub store: std::sync::Arc<MemoryStore>,
    pub failing: DesignRef,
}

#[cfg(test)]
#[async_trait]
impl CartRepository for FailingCarts {
    async fn items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        CartRepository::items(self.store.as_ref(), user).await
    }

    async fn find_item(
        &self,
        user: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        CartRepository::find_item(self.store.as_ref(), user, item).await
    }

    async fn find_item_by_design(
        &self,
        user: UserId,
        design: &DesignRef,
    ) -> Result<Option<CartItem>, RepositoryError> {
        if *design == self.failing {
            return Err(RepositoryError::DataCorruption("cart table unavailable".to_string()));
        }
        CartRepository::find_item_by_design(self.store.as_ref(), user, design).await
    }

    async fn insert_item(
        &self,
        user: UserId,
        item: &NewCartItem,
    ) -> Result<CartItem, RepositoryError> {
        CartRepository::insert_item(self.store.as_ref(), user, item).await
    }

    async fn update_item(
        &self,
        user: UserId,
        item: CartItemId,
        sizes: &SizeQuantities,
        unit_price: Decimal,
    ) -> Result<Option<CartItem>, RepositoryError> {
        CartRepository::update_item(self.store.as_ref(), user, item, sizes, unit_price).await
    }

    async fn delete_item(&self, user: UserId, item: CartItemId) -> Result<bool, RepositoryError> {
        CartRepository::delete_item(self.store.as_ref(), user, item).await
    }

    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        CartRepository::clear(self.store.as_ref(), user).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::Thumbnails;

    fn new_design(owner: Owner, brand: BrandId, name: &str) -> NewDesign {
        NewDesign {
            owner,
            brand_id: brand,
            name: name.to_owned(),
            product_id: ProductId::new(1),
            data: json!({}),
            thumbnails: Thumbnails::default(),
            public: false,
        }
    }

    #[tokio::test]
    async fn test_single_default_brand() {
        let store = MemoryStore::default();
        BrandRepository::create(&store, &NewBrand::default_brand()).await.unwrap();
        let again = BrandRepository::create(&store, &NewBrand::default_brand()).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_design_names_unique_per_user_and_brand() {
        let store = MemoryStore::default();
        let user = Owner::User(UserId::new(100));
        let brand = BrandId::new(1);

        DesignRepository::insert(&store, &new_design(user, brand, "Crest")).await.unwrap();
        let dup = DesignRepository::insert(&store, &new_design(user, brand, "Crest")).await;
        assert!(matches!(dup, Err(RepositoryError::Conflict(_))));

        DesignRepository::insert(&store, &new_design(user, BrandId::new(2), "Crest"))
            .await
            .unwrap();

        let guest = Owner::Guest(GuestId::generate());
        DesignRepository::insert(&store, &new_design(guest, brand, "Crest")).await.unwrap();
        DesignRepository::insert(&store, &new_design(guest, brand, "Crest")).await.unwrap();
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = MemoryStore::default();
        let guest = Owner::Guest(GuestId::generate());
        let other = Owner::Guest(GuestId::generate());
        let design = DesignRepository::insert(&store, &new_design(guest, BrandId::new(1), "Crest"))
            .await
            .unwrap();

        assert!(store.find_owned(design.id, guest).await.unwrap().is_some());
        assert!(store.find_owned(design.id, other).await.unwrap().is_none());
        assert!(!store.set_visibility(design.id, other, true).await.unwrap());
        assert!(!DesignRepository::delete(&store, design.id, other).await.unwrap());
        assert!(DesignRepository::delete(&store, design.id, guest).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_token_single_use() {
        let store = MemoryStore::default();
        let token = store.create_reset_token(UserId::new(1), "abc").await.unwrap();
        assert!(store.mark_reset_token_used(token.id).await.unwrap());
        assert!(!store.mark_reset_token_used(token.id).await.unwrap());
    }
}
