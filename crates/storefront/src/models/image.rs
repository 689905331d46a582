//! Uploaded design image types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use model2design_core::{DesignImageId, Owner};

/// Prefix of the public id of a customer-uploaded image.
pub const USER_IMAGE_PREFIX: &str = "user_";

/// An image a customer uploaded for use in their designs.
#[derive(Debug, Clone)]
pub struct DesignImage {
    pub id: DesignImageId,
    pub owner: Owner,
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl DesignImage {
    /// The id the image library shows, `user_{id}`.
    #[must_use]
    pub fn public_id(&self) -> String {
        format!("{USER_IMAGE_PREFIX}{}", self.id)
    }

    /// Short type label such as `png`.
    #[must_use]
    pub fn filetype(&self) -> &str {
        self.content_type
            .strip_prefix("image/")
            .unwrap_or(&self.content_type)
    }

    /// JSON shape used by the designer's image library.
    #[must_use]
    pub fn to_library_entry(&self) -> ImageLibraryEntry {
        ImageLibraryEntry {
            id: self.public_id(),
            name: self.name.clone(),
            image_url: self.url.clone(),
            thumbnail_url: self.url.clone(),
            width: self.width,
            height: self.height,
            file_size: self.file_size,
            filetype: self.filetype().to_string(),
            created_at: self.created_at,
            source: "user",
            category_id: None,
        }
    }
}

/// An image as listed in the designer's image library.
#[derive(Debug, Clone, Serialize)]
pub struct ImageLibraryEntry {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub filetype: String,
    pub created_at: DateTime<Utc>,
    pub source: &'static str,
    pub category_id: Option<i32>,
}

/// Fields for recording an uploaded image.
#[derive(Debug, Clone)]
pub struct NewDesignImage {
    pub owner: Owner,
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub content_type: String,
}

/// Errors parsing a library image id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageIdError {
    #[error("Invalid image ID format")]
    InvalidFormat,
    #[error("Invalid image ID")]
    InvalidId,
}

/// Parse a `user_{id}` library id.
///
/// # Errors
///
/// [`ImageIdError::InvalidFormat`] without the `user_` prefix,
/// [`ImageIdError::InvalidId`] when the rest is not a number.
pub fn parse_image_id(s: &str) -> Result<DesignImageId, ImageIdError> {
    let raw = s
        .strip_prefix(USER_IMAGE_PREFIX)
        .ok_or(ImageIdError::InvalidFormat)?;
    raw.parse().map_err(|_| ImageIdError::InvalidId)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use model2design_core::GuestId;

    use super::*;

    #[test]
    fn test_parse_image_id() {
        assert_eq!(parse_image_id("user_42").unwrap(), DesignImageId::new(42));
        assert_eq!(parse_image_id("brand_42"), Err(ImageIdError::InvalidFormat));
        assert_eq!(parse_image_id("user_abc"), Err(ImageIdError::InvalidId));
    }

    #[test]
    fn test_library_entry_shape() {
        let image = DesignImage {
            id: DesignImageId::new(7),
            owner: Owner::Guest(GuestId::generate()),
            name: "logo".to_string(),
            url: "/media/design_images/logo.png".to_string(),
            width: 640,
            height: 480,
            file_size: 2048,
            content_type: "image/png".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(image.to_library_entry()).unwrap();
        assert_eq!(json["id"], "user_7");
        assert_eq!(json["thumbnail_url"], json["image_url"]);
        assert_eq!(json["filetype"], "png");
        assert_eq!(json["source"], "user");
        assert!(json["category_id"].is_null());
    }
}
