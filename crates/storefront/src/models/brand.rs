//! Brand (tenant) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use model2design_core::{
    BrandId, BrandPalette, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR, slugify,
};

/// Name given to the brand created when no default brand exists.
pub const DEFAULT_BRAND_NAME: &str = "Model2Design";

/// Headline given to the lazily created default brand.
pub const DEFAULT_BRAND_HEADLINE: &str =
    "Design and customize premium products with our advanced 3D modeling platform.";

/// A storefront tenant, selected per request by subdomain.
#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    /// `None` for the default brand served on the apex domain.
    pub subdomain: Option<String>,
    pub headline: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub contact_email: Option<String>,
    pub website_url: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// CSS custom properties for this brand's colours.
    #[must_use]
    pub fn palette(&self) -> BrandPalette {
        BrandPalette::new(&self.primary_color, &self.secondary_color)
    }
}

/// Fields for creating a brand.
#[derive(Debug, Clone)]
pub struct NewBrand {
    pub name: String,
    pub slug: String,
    pub subdomain: Option<String>,
    pub headline: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub contact_email: Option<String>,
    pub website_url: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
}

impl NewBrand {
    /// An active, non-default brand with baseline styling.
    ///
    /// The slug is derived from the name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: slugify(&name),
            name,
            subdomain: None,
            headline: String::new(),
            description: String::new(),
            logo_url: None,
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
            contact_email: None,
            website_url: None,
            is_default: false,
            is_active: true,
        }
    }

    /// The brand created on demand when no active default exists.
    #[must_use]
    pub fn default_brand() -> Self {
        Self {
            headline: DEFAULT_BRAND_HEADLINE.to_string(),
            is_default: true,
            ..Self::named(DEFAULT_BRAND_NAME)
        }
    }

    #[must_use]
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into().to_ascii_lowercase());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_brand_values() {
        let brand = NewBrand::default_brand();
        assert_eq!(brand.name, "Model2Design");
        assert_eq!(brand.slug, "model2design");
        assert!(brand.is_default && brand.is_active);
        assert_eq!(brand.subdomain, None);
        assert_eq!(brand.primary_color, "#007bff");
        assert_eq!(brand.secondary_color, "#6c757d");
    }

    #[test]
    fn test_named_brand_derives_slug() {
        let brand = NewBrand::named("Acme Outfitters").with_subdomain("ACME");
        assert_eq!(brand.slug, "acme-outfitters");
        assert_eq!(brand.subdomain.as_deref(), Some("acme"));
        assert!(!brand.is_default);
    }
}
