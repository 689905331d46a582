//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session layer (tower-sessions)
//! 6. Brand resolution (tenant for the request host)
//! 7. Rate limiting (governor, per route group)

pub mod auth;
pub mod brand;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    CurrentOwner, OptionalAuth, RequireAuth, clear_current_user, guest_id, load_guest_cart,
    save_guest_cart, set_current_user, take_guest_state,
};
pub use brand::{CurrentBrand, brand_middleware};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{REMEMBER_ME_SECONDS, SESSION_COOKIE_NAME, create_session_layer, postgres_store};
