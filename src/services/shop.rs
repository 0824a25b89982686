//! Shop catalog with category filter and name search

use serde::Deserialize;

use crate::db::repositories::Collection;
use crate::models::{Product, ShopCatalog, ShopCategory, ALL_CATEGORY};
use crate::services::error::ContentResult;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopFilter {
    /// Category name; empty or "All" matches every product
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

pub struct ShopService {
    products: Collection<Product>,
    categories: Collection<ShopCategory>,
}

impl ShopService {
    pub fn new(products: Collection<Product>, categories: Collection<ShopCategory>) -> Self {
        Self {
            products,
            categories,
        }
    }

    pub async fn catalog(&self, filter: &ShopFilter) -> ContentResult<ShopCatalog> {
        let (products, stored) = tokio::try_join!(self.products.list(None), self.categories.list(None))?;

        let mut categories = Vec::with_capacity(stored.len() + 1);
        categories.push(ShopCategory::all());
        categories.extend(stored);

        Ok(ShopCatalog {
            categories,
            products: filter_products(products, filter),
        })
    }
}

/// Exact category match and case-insensitive name search
pub fn filter_products(products: Vec<Product>, filter: &ShopFilter) -> Vec<Product> {
    let category = filter
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORY);
    let search = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    products
        .into_iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .filter(|p| {
            search
                .as_deref()
                .map_or(true, |s| p.name.to_lowercase().contains(s))
        })
        .collect()
}
