//! Session-related types.
//!
//! Types stored in the session for authentication state and guest identity.

use serde::{Deserialize, Serialize};

use model2design_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    pub full_name: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the id that owns a guest's designs and images.
    pub const GUEST_ID: &str = "guest_id";

    /// Key for the guest cart.
    pub const GUEST_CART: &str = "cart";
}

impl From<&crate::models::User> for CurrentUser {
    fn from(user: &crate::models::User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
        }
    }
}
