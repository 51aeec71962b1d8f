//! Catalog product as seen by the storefront.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, CollectionId, ProductId};
use super::price::Price;

/// A catalog product.
///
/// Products are sourced from the backend and never modified by the cart;
/// the cart only holds shared references to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend record id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    #[serde(default)]
    pub stock: u32,
    /// Primary image filename as stored on the record.
    #[serde(default)]
    pub image: Option<String>,
    /// Fully qualified URL for [`Self::image`].
    #[serde(default)]
    pub image_url: Option<String>,
    /// Category relation.
    #[serde(default)]
    pub category: Option<CategoryId>,
    /// Id of the collection the record belongs to.
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
    /// Name of the collection the record belongs to.
    #[serde(default)]
    pub collection_name: Option<String>,
}

impl Product {
    /// Create a product with only the fields the cart needs.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            stock: 0,
            image: None,
            image_url: None,
            category: None,
            collection_id: None,
            collection_name: None,
        }
    }

    /// Whether the product has an id the cart can match on.
    #[must_use]
    pub fn has_usable_id(&self) -> bool {
        !self.id.is_blank()
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}
