//! HTTP route handlers for storefront.
//!
//! Every endpoint speaks JSON and answers `{"success": bool, ...}`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database ping)
//!
//! # Brand and catalog
//! GET  /api/brand                           - Current brand and CSS variables
//! GET  /api/products                        - Products offered by the brand
//! GET  /api/products/{id}                   - Product detail
//!
//! # Cart (guest session or user)
//! GET  /api/cart                            - Cart with totals
//! POST /api/cart/add                        - Add a design in one size
//! POST /api/cart/items/{item_id}/sizes      - Replace size breakdown
//! POST /api/cart/items/{item_id}/remove     - Remove item
//! POST /api/cart/clear                      - Empty the cart
//! GET  /api/cart/count                      - Total quantity
//!
//! # Designs and images (guest or user)
//! GET  /api/designs                         - List own designs with stats
//! POST /api/designs                         - Save (multipart)
//! GET  /api/designs/{id}                    - Own design
//! POST /api/designs/{id}/visibility         - Make public or private
//! POST /api/designs/{id}/delete             - Delete
//! POST /api/designs/{id}/copy               - Copy a public design (auth)
//! GET  /api/designs/{id}/shared             - Public design
//! GET  /api/designs/images                  - Image library
//! POST /api/designs/images                  - Upload images (multipart)
//! DELETE /api/designs/images/{image_id}     - Delete image
//!
//! # Accounts
//! POST /api/accounts/register               - Register and sign in
//! POST /api/accounts/login                  - Sign in
//! POST /api/accounts/logout                 - Sign out
//! GET  /api/accounts/me                     - Profile
//! GET  /api/accounts/dashboard              - Profile with stats
//! POST /api/accounts/profile                - Update profile
//! POST /api/accounts/password               - Change password
//! POST /api/accounts/password/forgot        - Request reset link
//! POST /api/accounts/password/reset         - Reset with token
//!
//! # Support
//! GET  /api/support/categories              - Categories and choices
//! GET  /api/support/faqs                    - Active FAQs
//! GET  /api/support/tutorials               - Active tutorials
//! GET  /api/support/tutorials/{slug}        - One tutorial
//! POST /api/support/{category}              - Submit a request
//! ```

pub mod accounts;
pub mod brand;
pub mod cart;
pub mod designs;
pub mod health;
pub mod products;
pub mod support;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use serde::{Deserialize, Deserializer};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Largest multipart body accepted by the design endpoints.
const DESIGN_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Accept an id sent either as a JSON string or a number.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Create the account routes router.
pub fn account_routes(rate_limited: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/me", get(accounts::me))
        .route("/dashboard", get(accounts::dashboard))
        .route("/profile", post(accounts::update_profile))
        .route("/password", post(accounts::change_password))
        .route("/password/forgot", post(accounts::forgot_password))
        .route("/password/reset", post(accounts::reset_password));
    match auth_rate_limiter().filter(|_| rate_limited) {
        Some(limiter) => router.layer(limiter),
        None => router,
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/items/{item_id}/sizes", post(cart::update_sizes))
        .route("/items/{item_id}/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the design routes router.
pub fn design_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(designs::index).post(designs::save))
        .route(
            "/images",
            get(designs::list_images).post(designs::upload_images),
        )
        .route("/images/{image_id}", delete(designs::delete_image))
        .route("/templates", get(designs::templates))
        .route("/templates/{id}", get(designs::template))
        .route("/{id}", get(designs::show))
        .route("/{id}/visibility", post(designs::set_visibility))
        .route("/{id}/delete", post(designs::delete))
        .route("/{id}/copy", post(designs::copy))
        .route("/{id}/shared", get(designs::shared))
        .layer(DefaultBodyLimit::max(DESIGN_BODY_LIMIT))
}

/// Create the support routes router.
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(support::categories))
        .route("/faqs", get(support::faqs))
        .route("/tutorials", get(support::tutorials))
        .route("/tutorials/{slug}", get(support::tutorial))
        .route("/{category}", post(support::submit))
}

/// Create all API routes for the storefront.
///
/// With `rate_limited`, account endpoints get the strict per-IP limit and
/// everything else the relaxed one.
pub fn routes(rate_limited: bool) -> Router<AppState> {
    let api = Router::new()
        .route("/brand", get(brand::show))
        .route("/brand/templates", get(brand::public_templates))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .nest("/designs", design_routes())
        .nest("/support", support_routes());
    let api = match api_rate_limiter().filter(|_| rate_limited) {
        Some(limiter) => api.layer(limiter),
        None => api,
    };

    Router::new().nest(
        "/api",
        api.nest("/accounts", account_routes(rate_limited)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "string_or_number")]
        id: Option<String>,
    }

    #[test]
    fn test_string_or_number() {
        let parse = |json: &str| serde_json::from_str::<Body>(json).unwrap().id;
        assert_eq!(parse(r#"{"id": "guest_7"}"#), Some("guest_7".to_string()));
        assert_eq!(parse(r#"{"id": 42}"#), Some("42".to_string()));
        assert_eq!(parse(r#"{"id": null}"#), None);
        assert_eq!(parse("{}"), None);
    }
}
