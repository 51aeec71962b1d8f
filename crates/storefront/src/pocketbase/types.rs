//! Wire types for the PocketBase API.
//!
//! These mirror the JSON the backend sends and receives. Conversion into
//! domain types lives in `conversions`.

use pocket_shop_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Records
// =============================================================================

/// One page of a record listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: u32,
    pub items: Vec<T>,
}

/// A record from the products collection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_stock")]
    pub stock: u32,
    /// Single-file image field.
    #[serde(default)]
    pub image: Option<String>,
    /// Multi-file image field.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl ProductRecord {
    /// The image to show: `image` if set, else the first of `images`.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.images.first().map(String::as_str))
            .filter(|name| !name.is_empty())
    }
}

/// Stock arrives as a number or a numeric string depending on the
/// collection schema. Negative and unparsable values count as zero.
fn deserialize_stock<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stock {
        Number(f64),
        Text(String),
        Null,
    }

    let raw = match Stock::deserialize(deserializer)? {
        Stock::Number(n) => n,
        Stock::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Stock::Null => 0.0,
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to u32 range first
    let stock = raw.clamp(0.0, f64::from(u32::MAX)) as u32;
    Ok(stock)
}

/// A record from the auth collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Body for `auth-with-password`.
#[derive(Debug, Serialize)]
pub struct PasswordAuthRequest<'a> {
    pub identity: &'a str,
    pub password: &'a str,
}

/// Body for creating a user record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

/// Successful `auth-with-password` response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub record: UserRecord,
}

// =============================================================================
// Search
// =============================================================================

/// Query for `/api/products/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Raw `/api/products/search` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsResponse {
    pub items: Vec<ProductRecord>,
    pub total_items: i64,
    pub total_pages: u32,
    pub current_page: u32,
}

// =============================================================================
// Orders
// =============================================================================

/// One order line as the backend expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub cart_items: Vec<OrderLineRequest>,
    pub shipping_address: String,
}

/// Response for `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub message: String,
}

/// A record from the orders collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub created: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_record_from_listing_json() {
        let json = r#"{
            "id": "p1",
            "collectionId": "pbc_123",
            "collectionName": "products",
            "name": "Headphones",
            "description": "Wireless",
            "price": 129.99,
            "stock": "7",
            "images": ["front_a1b2.png", "back_c3d4.png"],
            "category": "cat1",
            "created": "2025-01-01 10:00:00.000Z"
        }"#;
        let record: ProductRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.stock, 7);
        assert_eq!(record.primary_image(), Some("front_a1b2.png"));
        assert_eq!(record.collection_id.as_deref(), Some("pbc_123"));
    }

    #[test]
    fn test_stock_variants() {
        let parse = |stock: &str| {
            serde_json::from_str::<ProductRecord>(&format!(r#"{{"id": "p", "stock": {stock}}}"#))
                .unwrap()
                .stock
        };
        assert_eq!(parse("12"), 12);
        assert_eq!(parse("3.0"), 3);
        assert_eq!(parse("-4"), 0);
        assert_eq!(parse("\"abc\""), 0);
        assert_eq!(parse("null"), 0);
    }

    #[test]
    fn test_primary_image_prefers_single_field() {
        let record = ProductRecord {
            image: Some("main.png".to_string()),
            images: vec!["other.png".to_string()],
            ..ProductRecord::default()
        };
        assert_eq!(record.primary_image(), Some("main.png"));

        let record = ProductRecord {
            image: Some(String::new()),
            ..ProductRecord::default()
        };
        assert_eq!(record.primary_image(), None);
    }

    #[test]
    fn test_create_order_request_wire_format() {
        let request = CreateOrderRequest {
            cart_items: vec![OrderLineRequest {
                product_id: ProductId::new("p1"),
                quantity: 2,
            }],
            shipping_address: "1 Main St".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cartItems": [{"productId": "p1", "quantity": 2}],
                "shippingAddress": "1 Main St"
            })
        );
    }

    #[test]
    fn test_search_params_skip_unset() {
        let params = SearchParams {
            query: Some("lamp".to_string()),
            per_page: Some(5),
            ..SearchParams::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"query": "lamp", "perPage": 5}));
    }
}
