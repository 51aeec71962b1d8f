//! Product source abstraction.
//!
//! The shopping session reads products through [`ProductSource`] so it can
//! be driven by the real backend or by an in-memory catalog in tests.

use std::future::Future;

use pocket_shop_core::{CurrencyCode, Price, Product, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::pocketbase::{BackendError, PocketBaseClient};

/// Read-only supplier of catalog products.
pub trait ProductSource {
    /// Every product in the catalog.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, BackendError>> + Send;

    /// One product by id.
    ///
    /// Implementations return `BackendError::NotFound` for unknown ids.
    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Product, BackendError>> + Send;
}

impl ProductSource for PocketBaseClient {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        Self::list_products(self).await
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        Self::get_product(self, id).await
    }
}

/// A fixed, in-memory catalog.
///
/// Used for offline browsing from a bundled product file.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

/// Entry of a bundled product file.
///
/// Ids may be numbers or strings; `image` is an absolute URL.
#[derive(Debug, Deserialize)]
struct BundledProduct {
    id: serde_json::Value,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: Option<String>,
    price: f64,
    #[serde(default)]
    stock: Option<u32>,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a bundled product file: a JSON array of
    /// `{id, name, description, image, price}` objects.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Parse` for malformed JSON and
    /// `BackendError::InvalidRecord` for unusable ids or prices.
    pub fn from_json(json: &str, currency: CurrencyCode) -> Result<Self, BackendError> {
        let bundled: Vec<BundledProduct> = serde_json::from_str(json)?;

        let products = bundled
            .into_iter()
            .map(|entry| {
                let id = match entry.id {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    other => {
                        return Err(BackendError::InvalidRecord {
                            id: other.to_string(),
                            reason: "id must be a string or number".to_string(),
                        });
                    }
                };
                let amount = Decimal::try_from(entry.price)
                    .ok()
                    .filter(|amount| !amount.is_sign_negative())
                    .ok_or_else(|| BackendError::InvalidRecord {
                        id: id.clone(),
                        reason: format!("price {} out of range", entry.price),
                    })?;

                let price = Price::new(amount.round_dp(2), currency);
                let mut product = Product::new(id, entry.name, price);
                product.description = entry.description;
                product.stock = entry.stock.unwrap_or_default();
                product.image_url.clone_from(&entry.image);
                product.image = entry.image;
                Ok(product)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(products))
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductSource for StaticCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        Ok(self.products.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        self.products
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("product {id}")))
    }
}
