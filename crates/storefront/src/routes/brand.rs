//! Current brand endpoints.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use model2design_core::{BrandId, BrandPalette};

use crate::error::Result;
use crate::middleware::{CurrentBrand, RequireAuth};
use crate::models::BrandTemplate;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BrandResponse {
    pub success: bool,
    pub brand: BrandInfo,
    /// CSS custom properties for the brand colours.
    pub css: BrandPalette,
}

#[derive(Debug, Serialize)]
pub struct BrandInfo {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub subdomain: Option<String>,
    pub headline: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub contact_email: Option<String>,
    pub website_url: Option<String>,
    pub is_default: bool,
}

/// The brand serving this host, with its styling.
#[instrument(skip_all)]
pub async fn show(CurrentBrand(brand): CurrentBrand) -> Json<BrandResponse> {
    let css = brand.palette();
    Json(BrandResponse {
        success: true,
        css,
        brand: BrandInfo {
            id: brand.id,
            name: brand.name,
            slug: brand.slug,
            subdomain: brand.subdomain,
            headline: brand.headline,
            description: brand.description,
            logo_url: brand.logo_url,
            primary_color: brand.primary_color,
            secondary_color: brand.secondary_color,
            contact_email: brand.contact_email,
            website_url: brand.website_url,
            is_default: brand.is_default,
        },
    })
}

#[derive(Debug, Serialize)]
pub struct BrandTemplatesResponse {
    pub success: bool,
    pub templates: Vec<BrandTemplate>,
}

/// Templates every brand has shared publicly. Sign-in required.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn public_templates(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<BrandTemplatesResponse>> {
    let templates = state.repos().templates.public_brand_templates().await?;
    Ok(Json(BrandTemplatesResponse {
        success: true,
        templates,
    }))
}
