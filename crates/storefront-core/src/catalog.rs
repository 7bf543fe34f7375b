use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::records::{HomepageSection, Order, Product};
use crate::ConfigError;

/// A catalog seed file: every collection the storefront reads from.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub sections: Vec<HomepageSection>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl CatalogFile {
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.products.len() + self.sections.len() + self.orders.len()
    }
}

/// Load and validate a catalog seed file.
///
/// Dangling references (a section or related-products list naming a product
/// that is not in the file) are allowed; readers drop unresolved ids.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    check_unique_ids("product", catalog.products.iter().map(|p| p.id.as_str()))?;
    check_unique_ids("section", catalog.sections.iter().map(|s| s.id.as_str()))?;
    check_unique_ids("order", catalog.orders.iter().map(|o| o.id.as_str()))?;

    for product in &catalog.products {
        if product.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "product '{}' must have a non-empty name",
                product.id
            )));
        }
        if product.price < Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "product '{}' has negative price {}",
                product.id, product.price
            )));
        }
    }

    for section in &catalog.sections {
        if section.title.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "section '{}' must have a non-empty title",
                section.id
            )));
        }
    }

    for order in &catalog.orders {
        if let Some(item) = order.items.iter().find(|i| i.quantity == 0) {
            return Err(ConfigError::Validation(format!(
                "order '{}' has zero quantity for product '{}'",
                order.id, item.product_id
            )));
        }
    }

    Ok(())
}

fn check_unique_ids<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() || id.contains('/') {
            return Err(ConfigError::Validation(format!(
                "{kind} id '{id}' must be non-empty and must not contain '/'"
            )));
        }
        if !seen.insert(id) {
            return Err(ConfigError::Validation(format!(
                "duplicate {kind} id: '{id}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
