//! Checkout service.
//!
//! Turns the current cart into an order, submits it, and clears the cart
//! only once the backend has accepted the order. A failed submission leaves
//! the cart exactly as it was so nothing is lost. There are no retries.

use std::future::Future;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, instrument, warn};

use pocket_shop_core::{Cart, CartStore, Price};

use crate::pocketbase::{
    BackendError, CreateOrderRequest, CreateOrderResponse, OrderLineRequest, OrderRecord,
    PocketBaseClient,
};
use crate::services::auth::AuthSession;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// No shipping address given.
    #[error("shipping address is required")]
    MissingShippingAddress,

    /// A line item cannot be ordered (e.g., its product has no id).
    #[error("cannot order line {position}: {reason}")]
    InvalidLineItem {
        /// 1-based position in the cart.
        position: usize,
        /// What makes the line unorderable.
        reason: String,
    },

    /// Checkout requires a signed-in user.
    #[error("sign in to check out")]
    NotSignedIn,

    /// The backend refused the token.
    #[error("session rejected: {0}")]
    Unauthorized(String),

    /// The backend refused the order (e.g., insufficient stock).
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Transport or decoding failure.
    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for CheckoutError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized(msg) => Self::Unauthorized(msg),
            BackendError::Api(api) => Self::Rejected(api.message),
            other => Self::Backend(other),
        }
    }
}

/// Where orders go.
pub trait OrderGateway {
    /// Submit an order on behalf of the token's user.
    fn submit_order(
        &self,
        token: &SecretString,
        order: &CreateOrderRequest,
    ) -> impl Future<Output = Result<CreateOrderResponse, BackendError>> + Send;

    /// Orders placed by the token's user.
    fn list_orders(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<OrderRecord>, BackendError>> + Send;
}

impl OrderGateway for PocketBaseClient {
    async fn submit_order(
        &self,
        token: &SecretString,
        order: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, BackendError> {
        self.create_order(token, order).await
    }

    async fn list_orders(&self, token: &SecretString) -> Result<Vec<OrderRecord>, BackendError> {
        Self::list_orders(self, token).await
    }
}

/// Summary of an accepted order.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    /// Number of distinct products ordered.
    pub lines: usize,
    /// Units across all lines.
    pub total_quantity: u64,
    /// Client-side subtotal, if the cart had a single currency.
    pub subtotal: Option<Price>,
    /// Message returned by the backend.
    pub message: String,
    /// When the backend accepted the order.
    pub placed_at: DateTime<Utc>,
}

/// Checkout service.
pub struct CheckoutService<'a, G> {
    gateway: &'a G,
}

impl<'a, G: OrderGateway> CheckoutService<'a, G> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Submit the cart as an order and clear it on success.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSignedIn`, `EmptyCart`,
    /// `MissingShippingAddress` or `InvalidLineItem` before any request is
    /// made, and `Unauthorized`, `Rejected` or `Backend` if submission
    /// fails. The cart is unchanged whenever an error is returned.
    #[instrument(skip_all, fields(lines = store.cart().len()))]
    pub async fn checkout(
        &self,
        store: &mut CartStore,
        session: Option<&AuthSession>,
        shipping_address: &str,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let session = session.ok_or(CheckoutError::NotSignedIn)?;
        let cart = store.snapshot();
        let order = build_order(&cart, shipping_address)?;

        let response = self
            .gateway
            .submit_order(session.token(), &order)
            .await
            .map_err(|e| {
                warn!(error = %e, "Order submission failed, cart kept");
                CheckoutError::from(e)
            })?;

        store.reset_cart();
        info!(user_id = %session.user_id(), lines = cart.len(), "Order placed");

        Ok(OrderConfirmation {
            lines: cart.len(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            message: response.message,
            placed_at: Utc::now(),
        })
    }

    /// Orders placed by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSignedIn` without a session, or the
    /// mapped backend error.
    pub async fn order_history(
        &self,
        session: Option<&AuthSession>,
    ) -> Result<Vec<OrderRecord>, CheckoutError> {
        let session = session.ok_or(CheckoutError::NotSignedIn)?;
        Ok(self.gateway.list_orders(session.token()).await?)
    }
}

/// Convert a cart into an order request.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart`, `MissingShippingAddress`, or
/// `InvalidLineItem` for lines whose product has a blank id.
pub fn build_order(
    cart: &Cart,
    shipping_address: &str,
) -> Result<CreateOrderRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let shipping_address = shipping_address.trim();
    if shipping_address.is_empty() {
        return Err(CheckoutError::MissingShippingAddress);
    }

    let cart_items = cart
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if line.product_id().is_blank() {
                return Err(CheckoutError::InvalidLineItem {
                    position: i + 1,
                    reason: format!("product '{}' has no id", line.product().name),
                });
            }
            Ok(OrderLineRequest {
                product_id: line.product_id().clone(),
                quantity: line.quantity(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CreateOrderRequest {
        cart_items,
        shipping_address: shipping_address.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pocket_shop_core::{CurrencyCode, Product, UserId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::pocketbase::{ApiError, UserRecord};

    /// Records submitted orders and answers with a canned result.
    struct RecordingGateway {
        fail_with: Option<u16>,
        submitted: Mutex<Vec<CreateOrderRequest>>,
    }

    impl RecordingGateway {
        fn accepting() -> Self {
            Self {
                fail_with: None,
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                fail_with: Some(status),
                submitted: Mutex::new(Vec::new()),
            }
        }
    }

    impl OrderGateway for RecordingGateway {
        async fn submit_order(
            &self,
            _token: &SecretString,
            order: &CreateOrderRequest,
        ) -> Result<CreateOrderResponse, BackendError> {
            self.submitted.lock().unwrap().push(order.clone());
            match self.fail_with {
                None => Ok(CreateOrderResponse {
                    message: "Order created successfully".to_string(),
                }),
                Some(401) => Err(BackendError::Unauthorized("Authentication required".to_string())),
                Some(status) => Err(BackendError::Api(ApiError::from_body(
                    status,
                    r#"{"error": "Insufficient stock for product: Lamp"}"#,
                ))),
            }
        }

        async fn list_orders(
            &self,
            _token: &SecretString,
        ) -> Result<Vec<OrderRecord>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn session() -> AuthSession {
        AuthSession::new(
            SecretString::from("token"),
            UserRecord {
                id: UserId::new("u1"),
                email: "shopper@example.com".to_string(),
                verified: true,
                name: None,
            },
        )
    }

    fn filled_store() -> CartStore {
        let price = Price::new(Decimal::new(1000, 2), CurrencyCode::USD);
        let mut store = CartStore::new();
        store.add_product(Product::new("a", "Lamp", price));
        store.add_product(Product::new("a", "Lamp", price));
        store.add_product(Product::new("b", "Rug", price));
        store
    }

    #[tokio::test]
    async fn test_checkout_success_resets_cart() {
        let gateway = RecordingGateway::accepting();
        let mut store = filled_store();

        let confirmation = CheckoutService::new(&gateway)
            .checkout(&mut store, Some(&session()), "  1 Main St ")
            .await
            .unwrap();

        assert!(store.items().is_empty());
        assert_eq!(confirmation.lines, 2);
        assert_eq!(confirmation.total_quantity, 3);
        assert_eq!(confirmation.subtotal.unwrap().display(), "$30.00");

        let submitted = gateway.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].shipping_address, "1 Main St");
        assert_eq!(
            submitted[0].cart_items,
            vec![
                OrderLineRequest {
                    product_id: "a".into(),
                    quantity: 2
                },
                OrderLineRequest {
                    product_id: "b".into(),
                    quantity: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_checkout_failure_keeps_cart() {
        let gateway = RecordingGateway::failing(500);
        let mut store = filled_store();
        let before = store.snapshot();

        let err = CheckoutService::new(&gateway)
            .checkout(&mut store, Some(&session()), "1 Main St")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(ref msg) if msg.contains("Insufficient stock")
        ));
        assert_eq!(store.cart(), &before);
    }

    #[tokio::test]
    async fn test_checkout_unauthorized_keeps_cart() {
        let gateway = RecordingGateway::failing(401);
        let mut store = filled_store();

        let err = CheckoutService::new(&gateway)
            .checkout(&mut store, Some(&session()), "1 Main St")
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Unauthorized(_)));
        assert_eq!(store.items().len(), 2);
    }

    #[tokio::test]
    async fn test_checkout_preconditions_make_no_request() {
        let gateway = RecordingGateway::accepting();
        let service = CheckoutService::new(&gateway);

        let mut empty = CartStore::new();
        assert!(matches!(
            service.checkout(&mut empty, Some(&session()), "1 Main St").await,
            Err(CheckoutError::EmptyCart)
        ));

        let mut store = filled_store();
        assert!(matches!(
            service.checkout(&mut store, None, "1 Main St").await,
            Err(CheckoutError::NotSignedIn)
        ));
        assert!(matches!(
            service.checkout(&mut store, Some(&session()), "   ").await,
            Err(CheckoutError::MissingShippingAddress)
        ));

        assert!(gateway.submitted.lock().unwrap().is_empty());
        assert_eq!(store.items().len(), 2);
    }

    #[test]
    fn test_build_order_rejects_blank_ids() {
        let price = Price::new(Decimal::ONE, CurrencyCode::USD);
        let mut store = CartStore::new();
        store.add_product(Product::new("a", "Lamp", price));
        store.add_product(Product::new("", "Mystery", price));

        let err = build_order(store.cart(), "1 Main St").unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidLineItem { position: 2, .. }));
    }
}
