//! Seed the database with the demo brands.
//!
//! Brands that already exist (matched by slug) are left alone, so the
//! command can be rerun safely.

use tracing::info;

use model2design_storefront::models::NewBrand;

use super::{CliError, repositories};

/// The two demo tenants served on their own subdomains.
fn demo_brands() -> Vec<NewBrand> {
    vec![
        NewBrand {
            description: "Premium sports apparel and accessories".to_string(),
            contact_email: Some("contact@acmesports.com".to_string()),
            website_url: Some("https://acmesports.com".to_string()),
            primary_color: "#ff6b35".to_string(),
            secondary_color: "#004e98".to_string(),
            ..NewBrand::named("Acme Sports").with_subdomain("acme")
        },
        NewBrand {
            description: "Professional technology merchandise and branding".to_string(),
            contact_email: Some("hello@techgearpro.com".to_string()),
            website_url: Some("https://techgearpro.com".to_string()),
            primary_color: "#2563eb".to_string(),
            secondary_color: "#64748b".to_string(),
            ..NewBrand::named("Tech Gear Pro").with_subdomain("techgear")
        },
    ]
}

/// Create the demo brands and the default brand.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn brands() -> Result<(), CliError> {
    let repos = repositories().await?;

    for brand in demo_brands() {
        if repos.brands.find_by_slug(&brand.slug).await?.is_some() {
            info!(slug = %brand.slug, "Brand already exists, skipping");
            continue;
        }
        let created = repos.brands.create(&brand).await?;
        info!(id = %created.id, subdomain = ?created.subdomain, "Created brand: {}", created.name);
    }

    match repos.brands.find_default().await? {
        Some(existing) => info!("Default brand already exists: {}", existing.name),
        None => {
            let created = repos.brands.create(&NewBrand::default_brand()).await?;
            info!(id = %created.id, "Created default brand: {}", created.name);
        }
    }

    info!("Brands seeded successfully!");
    Ok(())
}
