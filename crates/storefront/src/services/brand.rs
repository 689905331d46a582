//! Brand resolution.
//!
//! Every request is served for one brand: the active brand whose subdomain
//! matches the host, otherwise the default brand. The default brand is
//! created the first time it is needed.

use model2design_core::extract_subdomain;

use crate::db::{BrandRepository, RepositoryError};
use crate::models::{Brand, NewBrand};

/// Resolves the brand serving a host.
pub struct BrandResolver<'a> {
    brands: &'a dyn BrandRepository,
    base_domain: Option<&'a str>,
}

impl<'a> BrandResolver<'a> {
    #[must_use]
    pub const fn new(brands: &'a dyn BrandRepository, base_domain: Option<&'a str>) -> Self {
        Self {
            brands,
            base_domain,
        }
    }

    /// The brand for a request host.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn resolve(&self, host: &str) -> Result<Brand, RepositoryError> {
        if let Some(subdomain) = extract_subdomain(host, self.base_domain)
            && let Some(brand) = self.brands.find_active_by_subdomain(&subdomain).await?
        {
            return Ok(brand);
        }
        self.default_brand().await
    }

    /// The active default brand, creating it if there is none.
    ///
    /// A deactivated default is demoted first so the new one can take its
    /// place, and the new brand gets the first free `model2design` slug. Two
    /// requests racing to create it both end up with the same row: the
    /// loser's insert violates the single-default index and it re-reads.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup or creation fails.
    pub async fn default_brand(&self) -> Result<Brand, RepositoryError> {
        if let Some(brand) = self.brands.find_default().await? {
            return Ok(brand);
        }

        let demoted = self.brands.demote_inactive_default().await?;
        if demoted > 0 {
            tracing::warn!(demoted, "Default brand is inactive, replacing it");
        }

        let mut brand = NewBrand::default_brand();
        brand.slug = self.free_slug(&brand.slug).await?;

        match self.brands.create(&brand).await {
            Ok(brand) => {
                tracing::info!(brand_id = %brand.id, slug = %brand.slug, "Created default brand");
                Ok(brand)
            }
            Err(RepositoryError::Conflict(reason)) => {
                tracing::debug!(%reason, "Default brand created concurrently, re-reading");
                self.brands
                    .find_default()
                    .await?
                    .ok_or(RepositoryError::Conflict(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// `base`, or `base-2`, `base-3`... whichever no brand uses yet.
    async fn free_slug(&self, base: &str) -> Result<String, RepositoryError> {
        if self.brands.find_by_slug(base).await?.is_none() {
            return Ok(base.to_owned());
        }
        let mut n = 2_u32;
        loop {
            let candidate = format!("{base}-{n}");
            if self.brands.find_by_slug(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            n = n.saturating_add(1);
        }
    }
}
