//! Spending category catalog, embedded from `catalog/default.toml`.

use std::sync::LazyLock;

use muni_budget_allocation_models::AllocationCategory;
use serde::{Deserialize, Serialize};

const DEFAULT_CATALOG_TOML: &str = include_str!("../catalog/default.toml");

static DEFAULT_CATALOG: LazyLock<Vec<CategoryDefinition>> = LazyLock::new(|| {
    parse_catalog_toml(DEFAULT_CATALOG_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse catalog/default.toml: {e}"))
});

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: String,
    /// Thai display name.
    pub name: String,
    pub description: String,
    /// Suggested share before any user input.
    pub percentage: f64,
    /// CSS hex color.
    pub color: String,
}

impl CategoryDefinition {
    /// Category at the given share of `total_budget`.
    #[must_use]
    pub fn allocate(&self, percentage: f64, total_budget: f64) -> AllocationCategory {
        AllocationCategory {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            percentage,
            amount: amount_for(percentage, total_budget),
            color: self.color.clone(),
        }
    }
}

/// `percentage / 100 * total_budget`.
#[must_use]
pub fn amount_for(percentage: f64, total_budget: f64) -> f64 {
    percentage / 100.0 * total_budget
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    categories: Vec<CategoryDefinition>,
}

/// Parses a catalog TOML document.
///
/// # Errors
///
/// Returns the TOML error message if the document is malformed.
pub fn parse_catalog_toml(toml_str: &str) -> Result<Vec<CategoryDefinition>, String> {
    toml::de::from_str::<CatalogFile>(toml_str)
        .map(|file| file.categories)
        .map_err(|e| e.to_string())
}

/// The built-in catalog.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (the file is baked in at
/// compile time, so this is caught by the tests below).
#[must_use]
pub fn default_catalog() -> &'static [CategoryDefinition] {
    &DEFAULT_CATALOG
}
