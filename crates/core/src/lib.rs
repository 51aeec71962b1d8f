//! Pocket Shop Core - Shared types and the cart store.
//!
//! This crate provides the types used across all Pocket Shop components:
//! - `storefront` - Backend client, auth, checkout and the shopping session
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients, no async. This keeps the cart logic testable on its own.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, statuses and products
//! - [`cart`] - Line items, immutable cart values and the owning [`CartStore`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartState, CartStore, LineItem};
pub use types::*;
