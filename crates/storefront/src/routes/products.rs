//! Catalog route handlers.
//!
//! Only products the current brand offers are visible; prices are the
//! brand's tiers when it overrides them.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use model2design_core::{PriceTiers, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::CurrentBrand;
use crate::models::{Offering, Product};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

/// A product as this brand sells it.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Brand tiers when overridden, otherwise the product's own.
    pub effective_price_tiers: PriceTiers,
    pub base_price: Decimal,
}

impl From<Offering> for ProductView {
    fn from(offering: Offering) -> Self {
        Self {
            effective_price_tiers: offering.effective_tiers().clone(),
            base_price: offering.base_price(),
            product: offering.product,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: ProductView,
}

/// Products offered by the current brand.
#[instrument(skip(state, brand), fields(brand = %brand.0.slug))]
pub async fn index(
    State(state): State<AppState>,
    brand: CurrentBrand,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductListResponse>> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let offerings = state
        .repos()
        .catalog
        .list_offerings(brand.0.id, category)
        .await?;

    Ok(Json(ProductListResponse {
        success: true,
        products: offerings.into_iter().map(ProductView::from).collect(),
    }))
}

/// One product offered by the current brand.
#[instrument(skip(state, brand), fields(brand = %brand.0.slug))]
pub async fn show(
    State(state): State<AppState>,
    brand: CurrentBrand,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let offering = state
        .repos()
        .catalog
        .offering(brand.0.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductResponse {
        success: true,
        product: offering.into(),
    }))
}
