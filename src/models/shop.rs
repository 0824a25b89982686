//! Shop catalog models

use serde::{Deserialize, Serialize};

/// Name of the synthetic category that matches every product
pub const ALL_CATEGORY: &str = "All";

/// Product document (`products` collection). `url` points at the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Prices are entered by hand and may be stored as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopCategory {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ShopCategory {
    pub fn all() -> Self {
        Self {
            id: ALL_CATEGORY.to_lowercase(),
            name: ALL_CATEGORY.to_string(),
            image_url: None,
        }
    }
}

/// Shop page: category tabs plus the filtered products
#[derive(Debug, Clone, Serialize)]
pub struct ShopCatalog {
    pub categories: Vec<ShopCategory>,
    pub products: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_accepts_number_or_text() {
        let a: Product = serde_json::from_value(json!({"name": "A", "price": 19.99})).unwrap();
        let b: Product = serde_json::from_value(json!({"name": "B", "price": "24.50"})).unwrap();
        assert_eq!(a.price, Some(Price::Amount(19.99)));
        assert_eq!(b.price, Some(Price::Text("24.50".to_string())));
    }
}
