//! Authentication extractors and session helpers.
//!
//! The signed-in user lives in the session as a [`CurrentUser`]. Visitors
//! without one are guests, identified by a session-held [`GuestId`] that owns
//! their designs and images.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use model2design_core::{GuestId, Owner};

use crate::error::AppError;
use crate::models::{CurrentUser, GuestCart, session_keys};

/// Extractor that requires a signed-in user.
///
/// Rejects with 401 `Authentication required` otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.full_name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        user.map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await?,
            None => None,
        };
        Ok(Self(user))
    }
}

/// Who owns what the request creates: the signed-in user, or the guest.
///
/// A guest id is assigned on first use and kept in the session.
pub struct CurrentOwner(pub Owner);

impl<S> FromRequestParts<S> for CurrentOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;
        if let Some(user) = current_user(session).await? {
            return Ok(Self(Owner::User(user.id)));
        }
        Ok(Self(Owner::Guest(guest_id(session).await?)))
    }
}

async fn current_user(
    session: &Session,
) -> Result<Option<CurrentUser>, tower_sessions::session::Error> {
    session.get(session_keys::CURRENT_USER).await
}

/// Helper to set the current user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// The guest id of this session, assigning one if needed.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn guest_id(session: &Session) -> Result<GuestId, tower_sessions::session::Error> {
    if let Some(id) = session.get::<GuestId>(session_keys::GUEST_ID).await? {
        return Ok(id);
    }
    let id = GuestId::generate();
    session.insert(session_keys::GUEST_ID, id).await?;
    Ok(id)
}

/// Remove and return the guest's markers: the guest id and the session cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn take_guest_state(
    session: &Session,
) -> Result<(Option<GuestId>, GuestCart), tower_sessions::session::Error> {
    let guest = session.remove::<GuestId>(session_keys::GUEST_ID).await?;
    let cart = session
        .remove::<GuestCart>(session_keys::GUEST_CART)
        .await?
        .unwrap_or_default();
    Ok((guest, cart))
}

/// The guest's session cart, empty when none was stored.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load_guest_cart(session: &Session) -> Result<GuestCart, tower_sessions::session::Error> {
    Ok(session
        .get::<GuestCart>(session_keys::GUEST_CART)
        .await?
        .unwrap_or_default())
}

/// Store the guest's session cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save_guest_cart(
    session: &Session,
    cart: &GuestCart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::GUEST_CART, cart).await
}
