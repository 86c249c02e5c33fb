//! # Catalog
//!
//! Product lookup behind the `Catalog` trait. The store database is an
//! external collaborator; `InMemoryCatalog` is loaded from a TOML file or
//! built from database records.

use crate::discount::Discount;
use crate::error::{ShopError, ShopResult};
use crate::product::{parse_price, Currency, Product};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Product lookup keyed by the id written on NFC tags.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a product.
    ///
    /// `Ok(None)` means the product does not exist; `Err` means the lookup
    /// itself could not be completed.
    async fn lookup(&self, product_id: &str) -> ShopResult<Option<Product>>;

    /// Look up a product, treating a miss as `ProductNotFound`
    async fn require(&self, product_id: &str) -> ShopResult<Product> {
        self.lookup(product_id)
            .await?
            .ok_or_else(|| ShopError::ProductNotFound {
                product_id: product_id.to_string(),
            })
    }
}

/// Type alias for a shared catalog (dynamic dispatch)
pub type SharedCatalog = Arc<dyn Catalog>;

/// A product as stored in the `products` node of the store database
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "ProdID")]
    pub prod_id: String,
    #[serde(rename = "prodName", default)]
    pub prod_name: String,
    #[serde(rename = "prodPrice", default)]
    pub prod_price: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

impl ProductRecord {
    /// Convert into a `Product`, parsing the price string in `currency`
    pub fn into_product(self, currency: Currency) -> ShopResult<Product> {
        let price = parse_price(&self.prod_price, currency)?;
        let mut product = Product::new(self.prod_id, self.prod_name, price);
        if !self.image_url.is_empty() {
            product.image_url = Some(self.image_url);
        }
        Ok(product)
    }
}

/// Catalog held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub discounts: Vec<Discount>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
            discounts: Vec::new(),
        }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Builder: add a product
    pub fn with_product(mut self, product: Product) -> Self {
        self.add(product);
        self
    }

    /// Builder: add a discount
    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discounts.push(discount);
        self
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Build a catalog from the `products` node of the store database.
    ///
    /// The node is either an array or an object keyed by push id. Records with
    /// an unparsable price are skipped with a warning.
    pub fn from_records(value: &serde_json::Value, currency: Currency) -> ShopResult<Self> {
        let entries: Vec<&serde_json::Value> = match value {
            serde_json::Value::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
            serde_json::Value::Object(map) => map.values().collect(),
            other => {
                return Err(ShopError::Serialization(format!(
                    "products node must be an array or object, got {}",
                    other
                )))
            }
        };

        let mut catalog = Self::new();
        for entry in entries {
            let record: ProductRecord = serde_json::from_value(entry.clone())
                .map_err(|e| ShopError::Serialization(format!("bad product record: {}", e)))?;
            let id = record.prod_id.clone();
            match record.into_product(currency) {
                Ok(product) => catalog.add(product),
                Err(e) => tracing::warn!("Skipping product {}: {}", id, e),
            }
        }
        Ok(catalog)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn lookup(&self, product_id: &str) -> ShopResult<Option<Product>> {
        Ok(self.get(product_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Price;
    use serde_json::json;

    #[test]
    fn test_from_toml() {
        let catalog = InMemoryCatalog::from_toml(
            r#"
            [[products]]
            id = "P1"
            name = "Milk"
            price = { amount = 12500, currency = "idr" }

            [[discounts]]
            id = "1"
            title = "Black Friday Sale"
            "#,
        )
        .unwrap();

        let milk = catalog.get("P1").unwrap();
        assert_eq!(milk.price, Price::from_cents(12500, Currency::IDR));
        assert_eq!(catalog.discounts.len(), 1);
    }

    #[test]
    fn test_from_records() {
        let value = json!({
            "-N1": { "ProdID": "P1", "prodName": "Milk", "prodPrice": "12,500", "imageUrl": "https://img/milk.png" },
            "-N2": { "ProdID": "P2", "prodName": "Bread", "prodPrice": "8,000", "imageUrl": "" },
            "-N3": { "ProdID": "P3", "prodName": "Broken", "prodPrice": "n/a" }
        });

        let catalog = InMemoryCatalog::from_records(&value, Currency::IDR).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.get("P1").unwrap().price.amount, 12500);
        assert_eq!(catalog.get("P2").unwrap().image_url, None);
        assert!(catalog.get("P3").is_none());
    }

    #[test]
    fn test_from_records_rejects_scalar() {
        assert!(InMemoryCatalog::from_records(&json!(42), Currency::IDR).is_err());
    }

    #[tokio::test]
    async fn test_lookup_and_require() {
        let catalog = InMemoryCatalog::new().with_product(Product::new(
            "P1",
            "Milk",
            Price::from_cents(12500, Currency::IDR),
        ));

        assert!(catalog.lookup("P1").await.unwrap().is_some());
        assert!(catalog.lookup("P9").await.unwrap().is_none());

        let err = catalog.require("P9").await.unwrap_err();
        assert_eq!(
            err,
            ShopError::ProductNotFound {
                product_id: "P9".into()
            }
        );
    }
}
