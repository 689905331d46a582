//! Catalog domain types.
//!
//! A [`Product`] is sold by a brand only through a [`BrandProduct`] row,
//! which may switch it off or replace its price tiers. [`Offering`] is the
//! resolved pair a handler prices against.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use model2design_core::{BrandId, PriceTiers, ProductId, slugify, unit_price};

/// A customizable product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    /// Path to the 3D model loaded by the design editor.
    pub model_url: String,
    pub thumbnail_url: String,
    pub categories: Vec<String>,
    /// Orderable sizes, in display order.
    pub sizes: Vec<String>,
    pub price_tiers: PriceTiers,
    pub details: Vec<String>,
    pub initial_layer: String,
    pub initial_bumpmap: String,
    pub supported_bumpmaps: Vec<String>,
    pub can_order: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }
}

/// Fields for creating or replacing a product, keyed by slug.
///
/// Deserializes from the catalog import file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "modelLink")]
    pub model_url: String,
    #[serde(default, alias = "thumbnail")]
    pub thumbnail_url: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default, alias = "prices")]
    pub price_tiers: PriceTiers,
    #[serde(default, alias = "productDetails")]
    pub details: Vec<String>,
    #[serde(default = "default_layer", alias = "initialLayer")]
    pub initial_layer: String,
    #[serde(default = "default_bumpmap", alias = "initialBumpmap")]
    pub initial_bumpmap: String,
    #[serde(default, alias = "supportedBumpmaps")]
    pub supported_bumpmaps: Vec<String>,
    #[serde(default = "default_true", alias = "canOrder")]
    pub can_order: bool,
}

fn default_layer() -> String {
    "Front".to_string()
}

fn default_bumpmap() -> String {
    "Polyester".to_string()
}

const fn default_true() -> bool {
    true
}

impl NewProduct {
    /// A minimal orderable product with the given sizes and tiers.
    #[must_use]
    pub fn new(name: impl Into<String>, sizes: &[&str], price_tiers: PriceTiers) -> Self {
        let name = name.into();
        Self {
            slug: slugify(&name),
            model_url: format!("/models/{}.glb", slugify(&name)),
            name,
            description: String::new(),
            thumbnail_url: String::new(),
            categories: Vec::new(),
            sizes: sizes.iter().map(|s| (*s).to_string()).collect(),
            price_tiers,
            details: Vec::new(),
            initial_layer: default_layer(),
            initial_bumpmap: default_bumpmap(),
            supported_bumpmaps: Vec::new(),
            can_order: true,
        }
    }

    /// Fill in the slug from the name when the import left it blank.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.name);
        }
        self
    }
}

/// A brand's listing of a product.
#[derive(Debug, Clone, Serialize)]
pub struct BrandProduct {
    pub brand_id: BrandId,
    pub product_id: ProductId,
    pub is_available: bool,
    /// Empty when the brand uses the product's own tiers.
    pub custom_price_tiers: PriceTiers,
}

/// A product as sold by one brand.
#[derive(Debug, Clone)]
pub struct Offering {
    pub product: Product,
    pub custom_price_tiers: PriceTiers,
}

impl Offering {
    /// Unit price for `quantity` units under this brand's pricing.
    #[must_use]
    pub fn unit_price(&self, quantity: i64) -> Decimal {
        unit_price(
            &self.product.price_tiers,
            Some(&self.custom_price_tiers),
            quantity,
        )
    }

    /// The tier table a customer of this brand sees.
    #[must_use]
    pub fn effective_tiers(&self) -> &PriceTiers {
        if self.custom_price_tiers.is_empty() {
            &self.product.price_tiers
        } else {
            &self.custom_price_tiers
        }
    }

    /// The advertised "from" price.
    #[must_use]
    pub fn base_price(&self) -> Decimal {
        self.effective_tiers().base_price()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tiers(pairs: &[(u32, i64)]) -> PriceTiers {
        PriceTiers::from_pairs(pairs.iter().map(|&(q, p)| (q, Decimal::from(p)))).unwrap()
    }

    fn product(price_tiers: PriceTiers) -> Product {
        let new = NewProduct::new("Pro Series Hoodie", &["Small", "Medium"], price_tiers);
        Product {
            id: ProductId::new(1),
            slug: new.slug,
            name: new.name,
            description: new.description,
            model_url: new.model_url,
            thumbnail_url: new.thumbnail_url,
            categories: vec!["Hoodies".to_string()],
            sizes: new.sizes,
            price_tiers: new.price_tiers,
            details: new.details,
            initial_layer: new.initial_layer,
            initial_bumpmap: new.initial_bumpmap,
            supported_bumpmaps: new.supported_bumpmaps,
            can_order: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_offering_prefers_brand_tiers() {
        let offering = Offering {
            product: product(tiers(&[(1, 100), (5, 80)])),
            custom_price_tiers: tiers(&[(1, 95), (10, 50)]),
        };
        assert_eq!(offering.unit_price(3), Decimal::from(95));
        assert_eq!(offering.unit_price(12), Decimal::from(50));
        assert_eq!(offering.base_price(), Decimal::from(95));
    }

    #[test]
    fn test_offering_without_override() {
        let offering = Offering {
            product: product(tiers(&[(1, 100), (5, 80)])),
            custom_price_tiers: PriceTiers::default(),
        };
        assert_eq!(offering.unit_price(6), Decimal::from(80));
        assert_eq!(offering.base_price(), Decimal::from(100));
        assert!(offering.product.has_size("Small"));
        assert!(!offering.product.has_size("XL"));
    }

    #[test]
    fn test_import_shape() {
        let yaml = r"
name: Elite Series LS Hood (SPF 40)
modelLink: /models/elite-series-ls-hood.glb
categories: [Hoodies]
sizes: [Small, Medium]
prices: {1: 80, 3: 70}
canOrder: false
";
        let product: NewProduct = serde_yaml::from_str(yaml).unwrap();
        let product = product.normalized();
        assert_eq!(product.slug, "elite-series-ls-hood-spf-40");
        assert_eq!(product.price_tiers.base_price(), Decimal::from(80));
        assert!(!product.can_order);
        assert_eq!(product.initial_layer, "Front");
    }
}
