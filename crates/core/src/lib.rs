//! Model2Design Core - Shared domain types.
//!
//! This crate provides the types shared by every Model2Design component:
//! - `storefront` - Multi-tenant storefront API (brands, catalog, cart, designs)
//! - `cli` - Command-line tools for migrations, seeding, and catalog imports
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing rules, size breakdowns, ownership, and
//! subdomain parsing live here so they can be tested without any runtime.
//!
//! # Modules
//!
//! - [`types`] - Ids, contact details, pricing, cart sizes, ownership, brands, support

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
