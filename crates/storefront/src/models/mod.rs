//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the `PostgreSQL` row
//! types in [`crate::db`].

pub mod brand;
pub mod cart;
pub mod catalog;
pub mod design;
pub mod image;
pub mod session;
pub mod support;
pub mod template;
pub mod user;

pub use brand::{Brand, NewBrand};
pub use cart::{CartItem, CartLineView, CartView, GuestCart, GuestCartLine, NewCartItem};
pub use catalog::{BrandProduct, NewProduct, Offering, Product};
pub use design::{
    DESIGNS_PER_PAGE, Design, DesignListQuery, DesignOrder, DesignPage, DesignStats, DesignUpdate,
    NewDesign, Thumbnails,
};
pub use image::{DesignImage, ImageIdError, ImageLibraryEntry, NewDesignImage, parse_image_id};
pub use session::{CurrentUser, keys as session_keys};
pub use support::{Faq, NewSupportSubmission, SupportSubmission, Tutorial};
pub use template::{
    BrandImage, BrandImageCategory, BrandTemplate, DesignTemplate, NewBrandImage,
    NewBrandTemplate, NewDesignTemplate,
};
pub use user::{NewUser, PasswordResetToken, ProfileUpdate, User};
