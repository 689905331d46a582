//! Business logic services for storefront.
//!
//! Services borrow the repositories they need for the duration of a request
//! and take the brand as an explicit argument.
//!
//! # Services
//!
//! - `auth` - Registration, login, profile, password change and reset
//! - `brand` - Brand resolution by host, lazy default brand
//! - `cart` - Guest session carts and user carts, pricing, merge on login
//! - `designs` - Saved designs: save, list, visibility, delete, copy
//! - `images` - Customer image uploads for the design editor
//! - `mailer` - Best-effort outbound email
//! - `migration` - Hand a guest's cart, designs, and images to a user
//! - `support` - Support intake and help content

pub mod auth;
pub mod brand;
pub mod cart;
pub mod designs;
pub mod images;
pub mod mailer;
pub mod migration;
pub mod support;

pub use auth::{AuthError, AuthService};
pub use brand::BrandResolver;
pub use cart::{CartError, CartService};
pub use designs::{DesignError, DesignService};
pub use images::{ImageError, ImageService};
pub use migration::{GuestMigration, MigrationReport};
pub use support::{SupportError, SupportService};
