//! Shopping session.
//!
//! A [`ShopSession`] is the one place a shopper's cart lives. It owns the
//! [`CartStore`], reads products through a [`ProductSource`], submits orders
//! through an [`OrderGateway`], and remembers who is signed in. Each
//! operation finishes before the next one starts; there is no shared cart.

use tracing::{debug, instrument};

use pocket_shop_core::{Cart, CartStore, Product, ProductId};

use crate::error::Result;
use crate::pocketbase::OrderRecord;
use crate::services::auth::AuthSession;
use crate::services::catalog::ProductSource;
use crate::services::checkout::{CheckoutService, OrderConfirmation, OrderGateway};

/// One shopper's session.
pub struct ShopSession<'a, S, G> {
    catalog: &'a S,
    orders: &'a G,
    cart: CartStore,
    auth: Option<AuthSession>,
}

impl<S, G> std::fmt::Debug for ShopSession<'_, S, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("cart", &self.cart)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl<'a, S, G> ShopSession<'a, S, G>
where
    S: ProductSource,
    G: OrderGateway,
{
    /// Start a session with an empty cart and nobody signed in.
    #[must_use]
    pub fn new(catalog: &'a S, orders: &'a G) -> Self {
        Self {
            catalog,
            orders,
            cart: CartStore::new(),
            auth: None,
        }
    }

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns the catalog's backend error.
    pub async fn browse(&self) -> Result<Vec<Product>> {
        Ok(self.catalog.list_products().await?)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` (wrapped) for unknown ids.
    pub async fn view(&self, id: &ProductId) -> Result<Product> {
        Ok(self.catalog.get_product(id).await?)
    }

    /// Fetch a product and add it to the cart.
    ///
    /// # Errors
    ///
    /// Returns the lookup error; the cart is unchanged in that case.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn add_to_cart(&mut self, id: &ProductId) -> Result<&Cart> {
        let product = self.catalog.get_product(id).await?;
        Ok(self.add_product(product))
    }

    /// Add an already-fetched product to the cart.
    pub fn add_product(&mut self, product: Product) -> &Cart {
        let cart = self.cart.add_product(product);
        debug!(lines = cart.len(), units = cart.total_quantity(), "Cart updated");
        cart
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        self.cart.cart()
    }

    /// Empty the cart.
    pub fn reset(&mut self) {
        self.cart.reset_cart();
    }

    /// Attach an authenticated user to the session.
    pub fn sign_in(&mut self, auth: AuthSession) {
        self.auth = Some(auth);
    }

    /// Forget the signed-in user. The cart is kept.
    pub fn sign_out(&mut self) -> Option<AuthSession> {
        self.auth.take()
    }

    #[must_use]
    pub const fn auth(&self) -> Option<&AuthSession> {
        self.auth.as_ref()
    }

    /// Place an order for the cart; the cart is emptied only on success.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` (wrapped) as described on
    /// [`CheckoutService::checkout`].
    pub async fn checkout(&mut self, shipping_address: &str) -> Result<OrderConfirmation> {
        let confirmation = CheckoutService::new(self.orders)
            .checkout(&mut self.cart, self.auth.as_ref(), shipping_address)
            .await?;
        Ok(confirmation)
    }

    /// Orders placed by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSignedIn` (wrapped) without a session.
    pub async fn orders(&self) -> Result<Vec<OrderRecord>> {
        Ok(CheckoutService::new(self.orders)
            .order_history(self.auth.as_ref())
            .await?)
    }
}
