//! Model2Design storefront library.
//!
//! Multi-tenant storefront API for 3D-customizable merchandise: brands
//! resolved by subdomain, a per-brand catalog, guest and user carts, saved
//! designs, accounts, and support intake. The binary in `main.rs` and the
//! integration tests both build the application through [`app::build_router`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
