//! Brand resolution middleware.
//!
//! Resolves the brand for the request host once, stores it as a request
//! extension for the [`CurrentBrand`] extractor, and tags the response with
//! `X-Brand-Name` and `X-Brand-Subdomain`.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header::HOST, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::Brand;
use crate::services::brand::BrandResolver;
use crate::state::AppState;

pub const BRAND_NAME_HEADER: &str = "x-brand-name";
pub const BRAND_SUBDOMAIN_HEADER: &str = "x-brand-subdomain";
/// Sent as `X-Brand-Subdomain` for brands without a subdomain.
const DEFAULT_SUBDOMAIN_HEADER_VALUE: &str = "default";

/// The brand serving this request.
#[derive(Debug, Clone)]
pub struct CurrentBrand(pub Brand);

/// Attach the resolved brand to the request.
///
/// # Errors
///
/// Returns `AppError::Database` if the brand cannot be loaded or created.
pub async fn brand_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default()
        .to_owned();

    let resolver = BrandResolver::new(
        state.repos().brands.as_ref(),
        state.config().base_domain.as_deref(),
    );
    let brand = resolver.resolve(&host).await?;
    tracing::Span::current().record("brand", brand.slug.as_str());

    let name = HeaderValue::from_str(&brand.name).ok();
    let subdomain = HeaderValue::from_str(
        brand.subdomain.as_deref().unwrap_or(DEFAULT_SUBDOMAIN_HEADER_VALUE),
    )
    .ok();
    request.extensions_mut().insert(CurrentBrand(brand));

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    if let Some(name) = name {
        headers.insert(BRAND_NAME_HEADER, name);
    }
    if let Some(subdomain) = subdomain {
        headers.insert(BRAND_SUBDOMAIN_HEADER, subdomain);
    }
    Ok(response)
}

impl<S> FromRequestParts<S> for CurrentBrand
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::Internal("brand middleware not installed".to_string()))
    }
}
