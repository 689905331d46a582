//! Core types for Model2Design.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod brand;
pub mod design_ref;
pub mod email;
pub mod host;
pub mod id;
pub mod owner;
pub mod phone;
pub mod pricing;
pub mod sizes;
pub mod support;

pub use brand::{BrandPalette, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR, hex_to_rgb, slugify};
pub use design_ref::{DesignRef, DesignRefError, GUEST_PREFIX};
pub use email::{Email, EmailError};
pub use host::{RESERVED_SUBDOMAINS, extract_subdomain};
pub use id::*;
pub use owner::{GuestId, Owner};
pub use phone::{Phone, PhoneError};
pub use pricing::{FALLBACK_UNIT_PRICE, PriceTiers, SHIPPING_FLAT_RATE, unit_price};
pub use sizes::SizeQuantities;
pub use support::{SupportCategory, UnknownCategory};
