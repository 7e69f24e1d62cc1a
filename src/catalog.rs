use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Closed set of product categories. Criteria coming back from the model are
/// kept as plain strings, so values outside this set simply never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Fitness,
    Kitchen,
    Books,
    Clothing,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Fitness => "Fitness",
            Category::Kitchen => "Kitchen",
            Category::Books => "Books",
            Category::Clothing => "Clothing",
        }
    }

    /// All category names, in schema order.
    pub fn names() -> [&'static str; 5] {
        ["Electronics", "Fitness", "Kitchen", "Books", "Clothing"]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single catalog entry. Loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: Category,
    pub price: f64,
    pub rating: f64,
    pub in_stock: bool,
}

/// Load the product catalog from a JSON file.
///
/// A missing or malformed file is a fatal startup error; the caller is
/// expected to propagate it out of `main`.
pub fn load_products<P: AsRef<Path>>(path: P) -> Result<Vec<Product>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read products file: {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid JSON in products file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserialization() {
        let json = r#"[
            {"name": "Wireless Headphones Pro", "category": "Electronics",
             "price": 89.99, "rating": 4.3, "in_stock": true}
        ]"#;
        let products: Vec<Product> = serde_json::from_str(json).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Wireless Headphones Pro");
        assert_eq!(products[0].category, Category::Electronics);
        assert!(products[0].in_stock);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let json = r#"{"name": "Toy Car", "category": "Toys",
                       "price": 9.99, "rating": 4.0, "in_stock": true}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_products("definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read products file"));
    }

    #[test]
    fn test_category_names_round_trip() {
        for name in Category::names() {
            let cat: Category = serde_json::from_str(&format!("\"{}\"", name)).unwrap();
            assert_eq!(cat.as_str(), name);
        }
    }
}
