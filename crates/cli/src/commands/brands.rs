//! Brand catalog assignment.

use tracing::info;

use super::{CliError, repositories};

/// List every orderable product not carried by another brand under the
/// default brand, at standard pricing.
///
/// # Errors
///
/// Returns [`CliError::NoDefaultBrand`] when no default brand exists.
pub async fn assign_default() -> Result<(), CliError> {
    let repos = repositories().await?;
    let brand = repos
        .brands
        .find_default()
        .await?
        .ok_or(CliError::NoDefaultBrand)?;

    let assigned = repos.catalog.assign_unowned_to_brand(brand.id).await?;
    info!(brand = %brand.name, assigned, "Assigned products to default brand");
    Ok(())
}
