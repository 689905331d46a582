//! Product catalog import.
//!
//! The file holds a list of products in YAML (JSON is accepted too, being
//! valid YAML). Products are matched by slug; a blank slug is derived from
//! the name. Both `snake_case` keys and the legacy camelCase ones
//! (`modelLink`, `prices`, `canOrder`, ...) are understood.
//!
//! ```yaml
//! - name: Pro Series Hoodie
//!   modelLink: /models/pro-series-hoodie.glb
//!   categories: [Hoodies]
//!   sizes: [Small, Medium, Large]
//!   prices: {1: 90, 3: 80, 5: 70}
//! ```

use std::path::Path;

use tracing::info;

use model2design_storefront::models::NewProduct;

use super::{CliError, repositories};

/// Parse a product file's contents.
fn parse(content: &str) -> Result<Vec<NewProduct>, CliError> {
    let products: Vec<NewProduct> = serde_yaml::from_str(content)?;
    Ok(products.into_iter().map(NewProduct::normalized).collect())
}

/// Insert or update every product in `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the
/// database rejects a product.
pub async fn import(file: &Path) -> Result<(), CliError> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CliError::Read {
            path: file.display().to_string(),
            source,
        })?;
    let products = parse(&content)?;
    info!(path = %file.display(), count = products.len(), "Parsed product file");

    let repos = repositories().await?;
    for product in &products {
        let saved = repos.catalog.upsert_product(product).await?;
        info!(id = %saved.id, slug = %saved.slug, "Imported {}", saved.name);
    }

    info!("Imported {} products", products.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_keys() {
        let products = parse(
            r"
- name: Pro Series Hoodie
  modelLink: /models/pro-series-hoodie.glb
  categories: [Hoodies]
  sizes: [Small, Medium]
  prices: {1: 90, 3: 80}
  canOrder: false
",
        )
        .unwrap();
        assert_eq!(products.len(), 1);
        let hoodie = products.first().unwrap();
        assert_eq!(hoodie.slug, "pro-series-hoodie");
        assert_eq!(hoodie.model_url, "/models/pro-series-hoodie.glb");
        assert_eq!(hoodie.sizes, ["Small", "Medium"]);
        assert_eq!(hoodie.price_tiers.iter().count(), 2);
        assert!(!hoodie.can_order);
        assert_eq!(hoodie.initial_layer, "Front");
    }

    #[test]
    fn test_parse_rejects_missing_model() {
        assert!(matches!(
            parse("- name: Nameless Tee\n"),
            Err(CliError::ProductFile(_))
        ));
    }
}
