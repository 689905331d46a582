//! Customer image uploads for the design editor.
//!
//! Each file is checked on its own; one bad file does not stop the others.
//! Width and height come from the image header, so a file that does not
//! decode as an image is rejected before it reaches storage.

use thiserror::Error;

use model2design_core::Owner;

use crate::db::{ImageRepository, RepositoryError};
use crate::models::{ImageIdError, ImageLibraryEntry, NewDesignImage, parse_image_id};
use crate::storage::{FileStorage, Upload};

/// Largest accepted upload, 10 MB.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Largest accepted resolution, 100 megapixels.
pub const MAX_IMAGE_PIXELS: u64 = 100_000_000;

/// Content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/avif",
];

const IMAGE_DIRECTORY: &str = "design_images";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No image files provided")]
    NoFiles,

    /// Every file was rejected; the per-file reasons are attached.
    #[error("No images could be uploaded")]
    NoneUploaded(Vec<String>),

    #[error("{0}")]
    InvalidId(#[from] ImageIdError),

    #[error("Image not found or access denied")]
    NotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of a batch upload with at least one success.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub images: Vec<ImageLibraryEntry>,
    /// `{file}: {reason}` for each rejected file.
    pub errors: Vec<String>,
}

/// Why a single file was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum Rejection {
    #[error("Invalid file type. Please upload a JPEG, PNG, GIF, or WebP image.")]
    InvalidType,
    #[error("File too large. Maximum size is 10MB.")]
    TooLarge,
    #[error("Image resolution too high ({0}x{1}). Please resize to under 100 megapixels.")]
    TooManyPixels(u64, u64),
    #[error("Could not process image. It may be corrupted or too large.")]
    Undecodable,
}

/// An upload that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CheckedImage {
    pub width: u32,
    pub height: u32,
    /// Stored file extension for the accepted content type.
    pub extension: &'static str,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// Check an upload's type, size, and resolution.
pub(crate) fn inspect(upload: &Upload) -> Result<CheckedImage, Rejection> {
    let content_type = upload.content_type.as_deref().unwrap_or_default();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(Rejection::InvalidType);
    }
    let extension = extension_for(content_type).ok_or(Rejection::InvalidType)?;
    if upload.size() > MAX_IMAGE_BYTES {
        return Err(Rejection::TooLarge);
    }

    let size = imagesize::blob_size(&upload.bytes).map_err(|_| Rejection::Undecodable)?;
    let width = u64::try_from(size.width).map_err(|_| Rejection::Undecodable)?;
    let height = u64::try_from(size.height).map_err(|_| Rejection::Undecodable)?;
    if width.saturating_mul(height) > MAX_IMAGE_PIXELS {
        return Err(Rejection::TooManyPixels(width, height));
    }
    Ok(CheckedImage {
        width: u32::try_from(width).map_err(|_| Rejection::Undecodable)?,
        height: u32::try_from(height).map_err(|_| Rejection::Undecodable)?,
        extension,
    })
}

/// A PNG header declaring the given dimensions.
#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13_u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

/// Upload, list, and delete an owner's images.
pub struct ImageService<'a> {
    images: &'a dyn ImageRepository,
    storage: &'a dyn FileStorage,
}

impl<'a> ImageService<'a> {
    #[must_use]
    pub const fn new(images: &'a dyn ImageRepository, storage: &'a dyn FileStorage) -> Self {
        Self { images, storage }
    }

    /// Store each acceptable file and record it for `owner`.
    ///
    /// `name` overrides the display name of every uploaded file.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::NoFiles` for an empty batch and
    /// `ImageError::NoneUploaded` when every file was rejected.
    pub async fn upload(
        &self,
        owner: Owner,
        uploads: Vec<Upload>,
        name: Option<&str>,
    ) -> Result<UploadOutcome, ImageError> {
        if uploads.is_empty() {
            return Err(ImageError::NoFiles);
        }

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let mut images = Vec::new();
        let mut errors = Vec::new();

        for upload in uploads {
            let checked = match inspect(&upload) {
                Ok(checked) => checked,
                Err(rejection) => {
                    errors.push(format!("{}: {rejection}", upload.filename));
                    continue;
                }
            };

            let url = match self
                .storage
                .save(IMAGE_DIRECTORY, checked.extension, &upload.bytes)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(error = %e, file = %upload.filename, "Failed to store image");
                    errors.push(format!("{}: {e}", upload.filename));
                    continue;
                }
            };

            let image = self
                .images
                .insert(&NewDesignImage {
                    owner,
                    name: name.unwrap_or(&upload.filename).to_owned(),
                    url,
                    width: checked.width,
                    height: checked.height,
                    file_size: upload.size(),
                    content_type: upload.content_type.clone().unwrap_or_default(),
                })
                .await?;
            images.push(image.to_library_entry());
        }

        if images.is_empty() {
            return Err(ImageError::NoneUploaded(errors));
        }
        tracing::info!(uploaded = images.len(), rejected = errors.len(), "Images uploaded");
        Ok(UploadOutcome { images, errors })
    }

    /// The owner's image library, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Repository` if the database operation fails.
    pub async fn list(&self, owner: Owner) -> Result<Vec<ImageLibraryEntry>, ImageError> {
        Ok(self
            .images
            .list(owner)
            .await?
            .iter()
            .map(|image| image.to_library_entry())
            .collect())
    }

    /// Forget an owned image. The stored file is left in place.
    ///
    /// Returns the deleted image's name.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::InvalidId` for a malformed id and
    /// `ImageError::NotFound` when the owner has no such image.
    pub async fn delete(&self, owner: Owner, public_id: &str) -> Result<String, ImageError> {
        let id = parse_image_id(public_id)?;
        let image = self
            .images
            .delete(id, owner)
            .await?
            .ok_or(ImageError::NotFound)?;
        tracing::info!(image_id = %id, "Image deleted");
        Ok(image.name)
    }
}
