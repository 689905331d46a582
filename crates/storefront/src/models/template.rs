//! Brand-curated starting points for the designer: design templates, the
//! brand's image library, and brand templates shared across tenants.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use model2design_core::{
    BrandId, BrandImageCategoryId, BrandImageId, BrandTemplateId, DesignTemplateId, ProductId,
};

use super::design::Thumbnails;
use super::image::ImageLibraryEntry;

/// Prefix of the public id of a brand library image.
pub const BRAND_IMAGE_PREFIX: &str = "brand_";

/// A ready-made design a brand offers in the designer.
///
/// Listed by `sort_order`, then newest first.
#[derive(Debug, Clone, Serialize)]
pub struct DesignTemplate {
    pub id: DesignTemplateId,
    pub brand_id: BrandId,
    pub name: String,
    pub description: String,
    pub product_id: ProductId,
    /// Editor layout, opaque to the server.
    pub data: Value,
    pub thumbnails: Thumbnails,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDesignTemplate {
    pub brand_id: BrandId,
    pub name: String,
    pub description: String,
    pub product_id: ProductId,
    pub data: Value,
    pub thumbnails: Thumbnails,
    pub is_active: bool,
    pub sort_order: i32,
}

/// A grouping of brand images such as backgrounds or logos.
#[derive(Debug, Clone, Serialize)]
pub struct BrandImageCategory {
    pub id: BrandImageCategoryId,
    pub brand_id: BrandId,
    pub name: String,
    pub slug: String,
}

/// An image a brand provides to every customer of its storefront.
#[derive(Debug, Clone)]
pub struct BrandImage {
    pub id: BrandImageId,
    pub brand_id: BrandId,
    pub category_id: Option<BrandImageCategoryId>,
    pub name: String,
    pub image_url: String,
    /// Empty when the full image doubles as its thumbnail.
    pub thumbnail_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBrandImage {
    pub brand_id: BrandId,
    pub category_id: Option<BrandImageCategoryId>,
    pub name: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: Option<u64>,
}

impl BrandImage {
    /// The id the image library shows, `brand_{id}`.
    #[must_use]
    pub fn public_id(&self) -> String {
        format!("{BRAND_IMAGE_PREFIX}{}", self.id)
    }

    /// JSON shape used by the designer's image library.
    ///
    /// Unknown dimensions and sizes are reported as zero.
    #[must_use]
    pub fn to_library_entry(&self) -> ImageLibraryEntry {
        let thumbnail_url = if self.thumbnail_url.is_empty() {
            self.image_url.clone()
        } else {
            self.thumbnail_url.clone()
        };
        ImageLibraryEntry {
            id: self.public_id(),
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            thumbnail_url,
            width: self.width.unwrap_or_default(),
            height: self.height.unwrap_or_default(),
            file_size: self.file_size.unwrap_or_default(),
            filetype: "jpg".to_string(),
            created_at: self.created_at,
            source: "brand",
            category_id: self.category_id.map(|id| id.as_i32()),
        }
    }
}

/// A template a brand shares with other brands.
#[derive(Debug, Clone, Serialize)]
pub struct BrandTemplate {
    pub id: BrandTemplateId,
    pub name: String,
    pub brand_name: String,
    pub thumbnail_url: String,
    pub usage_count: u32,
    #[serde(skip)]
    pub is_featured: bool,
}

#[derive(Debug, Clone)]
pub struct NewBrandTemplate {
    pub brand_id: BrandId,
    pub name: String,
    pub description: String,
    pub data: Value,
    pub thumbnail_url: String,
    pub is_public: bool,
    pub is_featured: bool,
    pub usage_count: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_image_library_entry() {
        let image = BrandImage {
            id: BrandImageId::new(4),
            brand_id: BrandId::new(1),
            category_id: Some(BrandImageCategoryId::new(9)),
            name: "Stripes".to_string(),
            image_url: "https://cdn.example.com/stripes.jpg".to_string(),
            thumbnail_url: String::new(),
            width: Some(800),
            height: None,
            file_size: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(image.to_library_entry()).unwrap();
        assert_eq!(json["id"], "brand_4");
        assert_eq!(json["source"], "brand");
        assert_eq!(json["category_id"], 9);
        assert_eq!(json["thumbnail_url"], json["image_url"]);
        assert_eq!(json["filetype"], "jpg");
        assert_eq!(json["height"], 0);
    }
}
