//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password login and sign-up
//! - `catalog` - Product sources (backend or bundled file)
//! - `checkout` - Order submission from the cart

pub mod auth;
pub mod catalog;
pub mod checkout;

pub use auth::{AuthError, AuthService, AuthSession};
pub use catalog::{ProductSource, StaticCatalog};
pub use checkout::{CheckoutError, CheckoutService, OrderConfirmation, OrderGateway};
