//! Saved designs.
//!
//! Designs belong to a user or to a guest session. Every lookup is scoped by
//! id and owner, so someone else's design is indistinguishable from a missing
//! one.

use thiserror::Error;

use model2design_core::{BrandId, DesignId, Owner, ProductId, UserId};

use crate::db::{DesignRepository, RepositoryError};
use crate::models::design::{copy_name, strip_decal_textures};
use crate::models::{
    Design, DesignListQuery, DesignPage, DesignStats, DesignUpdate, NewDesign, Thumbnails,
};
use crate::services::images::{CheckedImage, inspect};
use crate::storage::{FileStorage, StorageError, Upload};

/// Directory design previews are stored under.
const THUMBNAIL_DIRECTORY: &str = "design_thumbnails";

/// Errors from design operations. Display strings are shown to the customer.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request data: {0}")]
    InvalidData(String),

    #[error("A design with this name already exists. Please choose a different name.")]
    NameTaken,

    /// A preview image failed the upload checks, as `{side}: {reason}`.
    #[error("Invalid thumbnail {0}")]
    InvalidThumbnail(String),

    #[error("Design not found or access denied")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for DesignError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(_) => Self::NameTaken,
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Preview images sent with a save, one optional file per side.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailUploads {
    pub front: Option<Upload>,
    pub back: Option<Upload>,
    pub left: Option<Upload>,
    pub right: Option<Upload>,
}

/// The editor's save form.
#[derive(Debug, Clone, Default)]
pub struct SaveDesign {
    /// Numeric to update an existing design; anything else creates one.
    pub design_id: Option<String>,
    pub name: Option<String>,
    pub product: Option<String>,
    /// JSON text of the editor layout.
    pub data: Option<String>,
    pub public: bool,
    pub thumbnails: ThumbnailUploads,
}

/// Design operations within one brand.
pub struct DesignService<'a> {
    designs: &'a dyn DesignRepository,
    storage: &'a dyn FileStorage,
    brand: BrandId,
}

impl<'a> DesignService<'a> {
    #[must_use]
    pub const fn new(
        designs: &'a dyn DesignRepository,
        storage: &'a dyn FileStorage,
        brand: BrandId,
    ) -> Self {
        Self {
            designs,
            storage,
            brand,
        }
    }

    /// Create a design, or update the owner's design named by `design_id`.
    ///
    /// Thumbnails are only replaced for the sides that were uploaded.
    ///
    /// # Errors
    ///
    /// Returns `DesignError::MissingField`/`InvalidData` for a bad form,
    /// `NameTaken` on a duplicate name, and `NotFound` when updating a design
    /// the owner does not have.
    pub async fn save(&self, owner: Owner, form: SaveDesign) -> Result<Design, DesignError> {
        let name = required(form.name.as_deref(), "name")?.to_owned();
        let product = required(form.product.as_deref(), "product")?;
        let data = required(form.data.as_deref(), "data")?;

        let product_id = product
            .trim()
            .parse::<i32>()
            .map(ProductId::new)
            .map_err(|e| DesignError::InvalidData(e.to_string()))?;
        let mut data: serde_json::Value =
            serde_json::from_str(data).map_err(|e| DesignError::InvalidData(e.to_string()))?;
        strip_decal_textures(&mut data);

        let existing = form
            .design_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .map(|id| id.parse::<DesignId>().map_err(|_| DesignError::NotFound))
            .transpose()?;

        let thumbnails = check_thumbnails(form.thumbnails)?;

        let current = match existing {
            Some(id) => Some(self.get_owned(id, owner).await?),
            None => None,
        };
        if let Owner::User(user) = owner {
            let unchanged = current
                .as_ref()
                .is_some_and(|d| d.name == name && d.brand_id == self.brand);
            if !unchanged && self.designs.names(user, self.brand).await?.contains(&name) {
                return Err(DesignError::NameTaken);
            }
        }

        let thumbnails = self.store_thumbnails(thumbnails).await?;

        let design = if let Some(current) = current {
            self.designs
                .update(
                    current.id,
                    owner,
                    &DesignUpdate {
                        brand_id: self.brand,
                        name,
                        product_id,
                        data,
                        thumbnails,
                        public: form.public,
                    },
                )
                .await?
                .ok_or(DesignError::NotFound)?
        } else {
            self.designs
                .insert(&NewDesign {
                    owner,
                    brand_id: self.brand,
                    name,
                    product_id,
                    data,
                    thumbnails,
                    public: form.public,
                })
                .await?
        };

        tracing::info!(design_id = %design.id, "Design saved");
        Ok(design)
    }

    async fn store_thumbnails(
        &self,
        checked: CheckedThumbnails,
    ) -> Result<Thumbnails, DesignError> {
        Ok(Thumbnails {
            front: self.store_one(checked.front).await?,
            back: self.store_one(checked.back).await?,
            left: self.store_one(checked.left).await?,
            right: self.store_one(checked.right).await?,
        })
    }

    async fn store_one(
        &self,
        checked: Option<(Upload, CheckedImage)>,
    ) -> Result<Option<String>, DesignError> {
        let Some((upload, image)) = checked else {
            return Ok(None);
        };
        let url = self
            .storage
            .save(THUMBNAIL_DIRECTORY, image.extension, &upload.bytes)
            .await?;
        Ok(Some(url))
    }

    /// # Errors
    ///
    /// Returns `DesignError::NotFound` unless `owner` owns the design.
    pub async fn get_owned(&self, id: DesignId, owner: Owner) -> Result<Design, DesignError> {
        self.designs
            .find_owned(id, owner)
            .await?
            .ok_or(DesignError::NotFound)
    }

    /// A design anyone may view.
    ///
    /// # Errors
    ///
    /// Returns `DesignError::NotFound` unless the design is public.
    pub async fn get_public(&self, id: DesignId) -> Result<Design, DesignError> {
        self.designs
            .find_public(id)
            .await?
            .ok_or(DesignError::NotFound)
    }

    /// One page of the owner's designs in this brand.
    ///
    /// A page past the end yields the first page.
    ///
    /// # Errors
    ///
    /// Returns `DesignError::Repository` if the database operation fails.
    pub async fn list(
        &self,
        owner: Owner,
        mut query: DesignListQuery,
    ) -> Result<DesignPage, DesignError> {
        query.search = query
            .search
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        let total = self
            .designs
            .count_matching(owner, self.brand, query.search.as_deref())
            .await?;
        query.page = query.page_within(total);
        let designs = self.designs.list(owner, self.brand, &query).await?;
        Ok(DesignPage::new(designs, query.page, total))
    }

    /// # Errors
    ///
    /// Returns `DesignError::Repository` if the database operation fails.
    pub async fn stats(&self, owner: Owner) -> Result<DesignStats, DesignError> {
        Ok(self.designs.stats(owner, self.brand).await?)
    }

    /// # Errors
    ///
    /// Returns `DesignError::NotFound` unless `owner` owns the design.
    pub async fn set_visibility(
        &self,
        id: DesignId,
        owner: Owner,
        public: bool,
    ) -> Result<(), DesignError> {
        if self.designs.set_visibility(id, owner, public).await? {
            tracing::info!(design_id = %id, public, "Design visibility changed");
            Ok(())
        } else {
            Err(DesignError::NotFound)
        }
    }

    /// # Errors
    ///
    /// Returns `DesignError::NotFound` unless `owner` owns the design.
    pub async fn delete(&self, id: DesignId, owner: Owner) -> Result<(), DesignError> {
        if self.designs.delete(id, owner).await? {
            tracing::info!(design_id = %id, "Design deleted");
            Ok(())
        } else {
            Err(DesignError::NotFound)
        }
    }

    /// Copy a public design into the user's designs for this brand.
    ///
    /// The copy is private, shares the original's thumbnails, and is named
    /// `{name} (Copy)` with a number added when that name is taken.
    ///
    /// # Errors
    ///
    /// Returns `DesignError::NotFound` unless the original is public.
    pub async fn copy(&self, id: DesignId, user: UserId) -> Result<Design, DesignError> {
        let original = self.get_public(id).await?;
        let names = self.designs.names(user, self.brand).await?;
        let name = copy_name(&original.name, |candidate| {
            names.iter().any(|n| n == candidate)
        });

        let copy = self
            .designs
            .insert(&NewDesign {
                owner: Owner::User(user),
                brand_id: self.brand,
                name,
                product_id: original.product_id,
                data: original.data,
                thumbnails: original.thumbnails,
                public: false,
            })
            .await?;
        tracing::info!(original_id = %id, design_id = %copy.id, "Design copied");
        Ok(copy)
    }
}

/// Thumbnails that passed the image checks, not yet stored.
struct CheckedThumbnails {
    front: Option<(Upload, CheckedImage)>,
    back: Option<(Upload, CheckedImage)>,
    left: Option<(Upload, CheckedImage)>,
    right: Option<(Upload, CheckedImage)>,
}

fn check_thumbnails(uploads: ThumbnailUploads) -> Result<CheckedThumbnails, DesignError> {
    Ok(CheckedThumbnails {
        front: check_thumbnail("front", uploads.front)?,
        back: check_thumbnail("back", uploads.back)?,
        left: check_thumbnail("left", uploads.left)?,
        right: check_thumbnail("right", uploads.right)?,
    })
}

/// Empty file fields count as no upload.
fn check_thumbnail(
    side: &str,
    upload: Option<Upload>,
) -> Result<Option<(Upload, CheckedImage)>, DesignError> {
    let Some(upload) = upload.filter(|u| !u.bytes.is_empty()) else {
        return Ok(None);
    };
    let image = inspect(&upload)
        .map_err(|rejection| DesignError::InvalidThumbnail(format!("{side}: {rejection}")))?;
    Ok(Some((upload, image)))
}

fn required<'s>(value: Option<&'s str>, field: &'static str) -> Result<&'s str, DesignError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(DesignError::MissingField(field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use model2design_core::GuestId;
    use serde_json::json;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::images::test_png;
    use crate::storage::MemoryFileStorage;

    fn form(name: &str) -> SaveDesign {
        SaveDesign {
            name: Some(name.to_string()),
            product: Some("3".to_string()),
            data: Some(r#"{"layers":{"Front":{"decals":[{"url":"/a.png","texture":"xyz"}]}}}"#.to_string()),
            ..SaveDesign::default()
        }
    }

    fn png(name: &str) -> Upload {
        Upload {
            filename: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: test_png(32, 32),
        }
    }

    #[tokio::test]
    async fn test_save_validates_form() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let owner = Owner::User(UserId::new(1));

        let missing = SaveDesign {
            data: None,
            ..form("Crest")
        };
        let err = service.save(owner, missing).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: data");

        let bad_product = SaveDesign {
            product: Some("hoodie".to_string()),
            ..form("Crest")
        };
        assert!(matches!(
            service.save(owner, bad_product).await,
            Err(DesignError::InvalidData(_))
        ));

        let bad_json = SaveDesign {
            data: Some("{not json".to_string()),
            ..form("Crest")
        };
        assert!(matches!(
            service.save(owner, bad_json).await,
            Err(DesignError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_save_strips_textures_and_updates_in_place() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let owner = Owner::User(UserId::new(1));

        let mut first = form("Crest");
        first.thumbnails.front = Some(png("front.png"));
        first.thumbnails.back = Some(png("back.png"));
        let design = service.save(owner, first).await.unwrap();
        assert_eq!(design.data, json!({"layers":{"Front":{"decals":[{"url":"/a.png"}]}}}));
        assert_eq!(storage.len(), 2);

        let mut second = form("Crest v2");
        second.design_id = Some(design.id.to_string());
        second.public = true;
        second.thumbnails.front = Some(png("front2.png"));
        let updated = service.save(owner, second).await.unwrap();

        assert_eq!(updated.id, design.id);
        assert_eq!(updated.name, "Crest v2");
        assert!(updated.public);
        assert_ne!(updated.thumbnails.front, design.thumbnails.front);
        assert_eq!(updated.thumbnails.back, design.thumbnails.back);

        // Keeping the same name on update is not a conflict.
        let mut third = form("Crest v2");
        third.design_id = Some(design.id.to_string());
        assert!(service.save(owner, third).await.is_ok());
    }

    #[tokio::test]
    async fn test_thumbnails_are_checked_and_renamed() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let owner = Owner::User(UserId::new(1));

        let mut evil = form("Crest");
        evil.thumbnails.front = Some(Upload {
            filename: "evil.html".to_string(),
            content_type: Some("text/html".to_string()),
            bytes: b"<script>alert(1)</script>".to_vec(),
        });
        let err = service.save(owner, evil).await.unwrap_err();
        assert!(matches!(err, DesignError::InvalidThumbnail(_)));
        assert!(err.to_string().starts_with("Invalid thumbnail front: Invalid file type"));

        let mut not_an_image = form("Crest");
        not_an_image.thumbnails.left = Some(Upload {
            bytes: b"<html></html>".to_vec(),
            ..png("left.png")
        });
        assert!(matches!(
            service.save(owner, not_an_image).await,
            Err(DesignError::InvalidThumbnail(_))
        ));
        assert!(storage.is_empty());

        let mut disguised = form("Crest");
        disguised.thumbnails.front = Some(png("front.html"));
        let design = service.save(owner, disguised).await.unwrap();
        let url = design.thumbnails.front.unwrap();
        assert!(url.starts_with("/media/design_thumbnails/"));
        assert!(url.ends_with(".png"), "{url}");
    }

    #[tokio::test]
    async fn test_rejected_save_stores_no_thumbnails() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let owner = Owner::User(UserId::new(1));
        let stranger = Owner::User(UserId::new(2));

        let design = service.save(owner, form("Crest")).await.unwrap();
        service.save(owner, form("Badge")).await.unwrap();

        let mut duplicate = form("Crest");
        duplicate.thumbnails.front = Some(png("front.png"));
        assert!(matches!(
            service.save(owner, duplicate).await,
            Err(DesignError::NameTaken)
        ));

        let mut rename_onto_other = form("Badge");
        rename_onto_other.design_id = Some(design.id.to_string());
        rename_onto_other.thumbnails.back = Some(png("back.png"));
        assert!(matches!(
            service.save(owner, rename_onto_other).await,
            Err(DesignError::NameTaken)
        ));

        let mut hijack = form("Mine now");
        hijack.design_id = Some(design.id.to_string());
        hijack.thumbnails.front = Some(png("front.png"));
        assert!(matches!(
            service.save(stranger, hijack).await,
            Err(DesignError::NotFound)
        ));

        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let owner = Owner::User(UserId::new(1));

        service.save(owner, form("Crest")).await.unwrap();
        assert!(matches!(
            service.save(owner, form("Crest")).await,
            Err(DesignError::NameTaken)
        ));

        // Same name in another brand is fine.
        let other_brand = DesignService::new(&store, &storage, BrandId::new(2));
        assert!(other_brand.save(owner, form("Crest")).await.is_ok());
    }

    #[tokio::test]
    async fn test_guest_designs_are_scoped_to_their_guest() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let guest = Owner::Guest(GuestId::generate());
        let stranger = Owner::Guest(GuestId::generate());

        let design = service.save(guest, form("Crest")).await.unwrap();
        assert!(service.get_owned(design.id, guest).await.is_ok());
        assert!(matches!(
            service.get_owned(design.id, stranger).await,
            Err(DesignError::NotFound)
        ));

        let mut hijack = form("Mine now");
        hijack.design_id = Some(design.id.to_string());
        assert!(matches!(
            service.save(stranger, hijack).await,
            Err(DesignError::NotFound)
        ));
        assert!(matches!(
            service.delete(design.id, stranger).await,
            Err(DesignError::NotFound)
        ));
        assert!(matches!(
            service.set_visibility(design.id, stranger, true).await,
            Err(DesignError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_copy_requires_public_and_leaves_original() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let author = Owner::User(UserId::new(1));
        let reader = UserId::new(2);

        let mut original_form = form("Crest");
        original_form.thumbnails.front = Some(png("front.png"));
        let original = service.save(author, original_form).await.unwrap();
        assert!(matches!(
            service.copy(original.id, reader).await,
            Err(DesignError::NotFound)
        ));

        service.set_visibility(original.id, author, true).await.unwrap();
        let copy = service.copy(original.id, reader).await.unwrap();
        let second = service.copy(original.id, reader).await.unwrap();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.owner, Owner::User(reader));
        assert_eq!(copy.name, "Crest (Copy)");
        assert_eq!(second.name, "Crest (Copy 2)");
        assert!(!copy.public);
        assert_eq!(copy.thumbnails, original.thumbnails);

        let untouched = service.get_owned(original.id, author).await.unwrap();
        assert_eq!(untouched.name, "Crest");
        assert!(untouched.public);
    }

    #[tokio::test]
    async fn test_list_pages_and_searches() {
        let store = MemoryStore::default();
        let storage = MemoryFileStorage::default();
        let service = DesignService::new(&store, &storage, BrandId::new(1));
        let owner = Owner::User(UserId::new(1));
        for i in 0..11 {
            service.save(owner, form(&format!("Hoodie {i}"))).await.unwrap();
        }
        service.save(owner, form("Mug")).await.unwrap();

        let page = service
            .list(
                owner,
                DesignListQuery {
                    search: Some("hoodie".to_string()),
                    page: 2,
                    ..DesignListQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total_matching, 11);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.designs.len(), 2);

        let past_end = service
            .list(
                owner,
                DesignListQuery {
                    page: 40,
                    ..DesignListQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(past_end.page, 1);
        assert_eq!(past_end.designs.len(), 9);

        let stats = service.stats(owner).await.unwrap();
        assert_eq!(stats.total_designs, 12);
        assert_eq!(stats.recent_designs, 12);
        assert_eq!(stats.products_designed, 1);
    }
}
