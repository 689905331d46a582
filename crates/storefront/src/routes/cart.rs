//! Cart route handlers.
//!
//! Guests keep their cart in the session; signed-in users in the database.
//! Handlers see both through [`Shopper`].

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use model2design_core::{ProductId, SizeQuantities, UserId};

use super::string_or_number;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentBrand, OptionalAuth, load_guest_cart, save_guest_cart};
use crate::models::{CartView, GuestCart};
use crate::services::cart::{AddToCart, CartOwner, CartService};
use crate::state::AppState;

/// The visitor's cart, whichever kind it is.
pub struct Shopper {
    session: Session,
    user: Option<UserId>,
    guest_cart: GuestCart,
}

impl Shopper {
    fn owner(&mut self) -> CartOwner<'_> {
        match self.user {
            Some(user) => CartOwner::User(user),
            None => CartOwner::Guest(&mut self.guest_cart),
        }
    }

    /// Write a guest cart back to the session.
    async fn save(&self) -> Result<()> {
        if self.user.is_none() {
            save_guest_cart(&self.session, &self.guest_cart).await?;
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        let guest_cart = match user {
            Some(_) => GuestCart::default(),
            None => load_guest_cart(&session).await?,
        };
        Ok(Self {
            session,
            user: user.map(|u| u.id),
            guest_cart,
        })
    }
}

fn service<'a>(state: &'a AppState, brand: &CurrentBrand) -> CartService<'a> {
    CartService::new(
        state.repos().catalog.as_ref(),
        state.repos().carts.as_ref(),
        brand.0.id,
    )
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub success: bool,
    #[serde(flatten)]
    pub cart: CartView,
}

#[derive(Debug, Serialize)]
pub struct CartCountResponse {
    pub success: bool,
    pub message: &'static str,
    pub cart_count: u32,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub success: bool,
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub design_id: Option<String>,
    pub design_name: Option<String>,
    pub thumbnail: Option<String>,
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub size: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SizesRequest {
    #[serde(default)]
    pub sizes: BTreeMap<String, i64>,
}

/// The cart with prices, subtotal, shipping, and total.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    brand: CurrentBrand,
    mut shopper: Shopper,
) -> Result<Json<CartResponse>> {
    let cart = service(&state, &brand).view(&shopper.owner()).await?;
    Ok(Json(CartResponse {
        success: true,
        cart,
    }))
}

/// Add units of one size of a design.
#[instrument(skip(state, brand, shopper))]
pub async fn add(
    State(state): State<AppState>,
    brand: CurrentBrand,
    mut shopper: Shopper,
    Json(request): Json<AddRequest>,
) -> Result<Json<CartCountResponse>> {
    let cart_count = service(&state, &brand)
        .add(
            &mut shopper.owner(),
            AddToCart {
                design_id: request.design_id.unwrap_or_default(),
                design_name: request.design_name,
                thumbnail: request.thumbnail,
                product_id: request.product_id,
                size: request.size,
                quantity: request.quantity,
            },
        )
        .await?;
    shopper.save().await?;

    Ok(Json(CartCountResponse {
        success: true,
        message: "Item added to cart",
        cart_count,
    }))
}

/// Replace an item's size breakdown; an empty breakdown removes it.
#[instrument(skip(state, brand, shopper, request))]
pub async fn update_sizes(
    State(state): State<AppState>,
    brand: CurrentBrand,
    mut shopper: Shopper,
    Path(item_id): Path<String>,
    Json(request): Json<SizesRequest>,
) -> Result<Json<CartResponse>> {
    let carts = service(&state, &brand);
    carts
        .update_sizes(
            &mut shopper.owner(),
            &item_id,
            SizeQuantities::from_signed(request.sizes),
        )
        .await?;
    shopper.save().await?;

    let cart = carts.view(&shopper.owner()).await?;
    Ok(Json(CartResponse {
        success: true,
        cart,
    }))
}

#[instrument(skip(state, brand, shopper))]
pub async fn remove(
    State(state): State<AppState>,
    brand: CurrentBrand,
    mut shopper: Shopper,
    Path(item_id): Path<String>,
) -> Result<Json<CartCountResponse>> {
    let carts = service(&state, &brand);
    carts.remove(&mut shopper.owner(), &item_id).await?;
    shopper.save().await?;

    let cart_count = carts.count(&shopper.owner()).await?;
    Ok(Json(CartCountResponse {
        success: true,
        message: "Item removed from cart",
        cart_count,
    }))
}

#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    brand: CurrentBrand,
    mut shopper: Shopper,
) -> Result<Json<CartCountResponse>> {
    service(&state, &brand).clear(&mut shopper.owner()).await?;
    shopper.save().await?;

    Ok(Json(CartCountResponse {
        success: true,
        message: "Cart cleared",
        cart_count: 0,
    }))
}

#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    brand: CurrentBrand,
    mut shopper: Shopper,
) -> Result<Json<CountResponse>> {
    let count = service(&state, &brand).count(&shopper.owner()).await?;
    Ok(Json(CountResponse {
        success: true,
        count,
    }))
}
