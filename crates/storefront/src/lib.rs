//! Pocket Shop storefront library.
//!
//! Everything around the cart: configuration, the PocketBase client,
//! authentication, checkout, and the shopping session that ties them
//! together. Front ends (the CLI, tests) build on this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod pocketbase;
pub mod services;
pub mod session;
pub mod state;

pub use error::{AppError, Result};
pub use session::ShopSession;
pub use state::AppState;
