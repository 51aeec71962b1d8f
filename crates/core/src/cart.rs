//! In-memory shopping cart.
//!
//! A [`Cart`] is an immutable, ordered sequence of [`LineItem`]s. Every
//! mutation produces a new `Cart`; line items that did not change are shared
//! between the old and new value through `Arc`, so earlier snapshots stay
//! valid and cheap to keep around.
//!
//! [`CartStore`] is the single owner of the current cart for a session and
//! the only mutation surface: [`CartStore::add_product`] and
//! [`CartStore::reset_cart`].
//!
//! # Matching
//!
//! Line items are keyed by product id. A product whose id is blank has no
//! usable identifier and never matches an existing line; it is always
//! appended as a new line item.
//!
//! # Example
//!
//! ```
//! use pocket_shop_core::{CartStore, CurrencyCode, Price, Product};
//! use rust_decimal::Decimal;
//!
//! let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
//! let mut store = CartStore::new();
//!
//! store.add_product(Product::new("a", "Headphones", price));
//! store.add_product(Product::new("a", "Headphones", price));
//! store.add_product(Product::new("b", "Speaker", price));
//!
//! let quantities: Vec<_> = store
//!     .items()
//!     .iter()
//!     .map(|line| (line.product_id().as_str(), line.quantity()))
//!     .collect();
//! assert_eq!(quantities, [("a", 2), ("b", 1)]);
//!
//! store.reset_cart();
//! assert!(store.items().is_empty());
//! ```

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::types::{Price, Product, ProductId};

/// One product's presence in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    product: Arc<Product>,
    quantity: NonZeroU32,
}

impl LineItem {
    /// A new line with quantity 1.
    #[must_use]
    pub fn new(product: Arc<Product>) -> Self {
        Self {
            product,
            quantity: NonZeroU32::MIN,
        }
    }

    /// The referenced product.
    #[must_use]
    pub const fn product(&self) -> &Arc<Product> {
        &self.product
    }

    /// Shortcut for `self.product().id`.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Number of units, always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Unit price times quantity, or `None` if the amount overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.product.price.checked_times(self.quantity())
    }

    /// Same product reference, one more unit. Saturates at `u32::MAX`.
    #[must_use]
    fn incremented(&self) -> Self {
        Self {
            product: Arc::clone(&self.product),
            quantity: self.quantity.saturating_add(1),
        }
    }

    fn matches(&self, product: &Product) -> bool {
        product.has_usable_id() && self.product.id == product.id
    }
}

/// Whether the cart holds anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartState {
    Empty,
    HasItems,
}

/// An immutable cart value.
///
/// Cloning is a reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    items: Arc<[Arc<LineItem>]>,
}

impl Default for Cart {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }
}

impl Cart {
    /// The empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return a new cart with `product` added.
    ///
    /// If a line for the product's id exists it is replaced, in place, by a
    /// line with the same product reference and quantity + 1. Otherwise a
    /// new line with quantity 1 is appended. All other lines are shared with
    /// `self`.
    #[must_use]
    pub fn with_product(&self, product: impl Into<Arc<Product>>) -> Self {
        let product = product.into();

        let items: Vec<Arc<LineItem>> = match self.position_of(&product) {
            Some(index) => self
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if i == index {
                        Arc::new(item.incremented())
                    } else {
                        Arc::clone(item)
                    }
                })
                .collect(),
            None => self
                .items
                .iter()
                .cloned()
                .chain(std::iter::once(Arc::new(LineItem::new(product))))
                .collect(),
        };

        Self {
            items: items.into(),
        }
    }

    fn position_of(&self, product: &Product) -> Option<usize> {
        self.items.iter().position(|item| item.matches(product))
    }

    /// Line items in first-added order.
    #[must_use]
    pub fn items(&self) -> &[Arc<LineItem>] {
        &self.items
    }

    /// Iterate over line items in first-added order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().map(|item| &**item)
    }

    /// Number of line items (distinct products).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        if self.is_empty() {
            CartState::Empty
        } else {
            CartState::HasItems
        }
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Sum of all line totals.
    ///
    /// `None` for an empty cart, when lines are priced in different
    /// currencies, or when the sum overflows.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        let mut lines = self.iter().map(LineItem::line_total);
        let first = lines.next()??;
        lines.try_fold(first, |total, line| total.checked_add(line?))
    }

    /// The line for a product id, if present. Blank ids never match.
    #[must_use]
    pub fn line_for(&self, id: &ProductId) -> Option<&Arc<LineItem>> {
        if id.is_blank() {
            return None;
        }
        self.items.iter().find(|item| item.product_id() == id)
    }
}

/// Owner of the current cart.
///
/// One store exists per shopping session and is handed to consumers by
/// reference. Mutation requires `&mut`, so there is exactly one writer.
#[derive(Debug, Default)]
pub struct CartStore {
    cart: Cart,
}

impl CartStore {
    /// A store holding the empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product` and return the new cart.
    pub fn add_product(&mut self, product: impl Into<Arc<Product>>) -> &Cart {
        self.cart = self.cart.with_product(product);
        &self.cart
    }

    /// Replace the cart with the empty cart. Idempotent.
    pub fn reset_cart(&mut self) {
        self.cart = Cart::empty();
    }

    /// Current line items.
    #[must_use]
    pub fn items(&self) -> &[Arc<LineItem>] {
        self.cart.items()
    }

    /// Current cart value.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Cheap copy of the current cart that later mutations do not affect.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.cart.clone()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        self.cart.state()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::CurrencyCode;

    fn product(id: &str) -> Product {
        Product::new(id, format!("Product {id}"), usd(1000))
    }

    fn usd(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2), CurrencyCode::USD)
    }

    fn summary(store: &CartStore) -> Vec<(String, u32)> {
        store
            .items()
            .iter()
            .map(|line| (line.product_id().to_string(), line.quantity()))
            .collect()
    }

    #[test]
    fn test_add_to_empty_cart() {
        let mut store = CartStore::new();
        assert_eq!(store.state(), CartState::Empty);

        store.add_product(product("a"));

        assert_eq!(summary(&store), [("a".to_string(), 1)]);
        assert_eq!(store.state(), CartState::HasItems);
    }

    #[test]
    fn test_add_existing_increments() {
        let mut store = CartStore::new();
        store.add_product(product("a"));
        store.add_product(product("a"));

        assert_eq!(summary(&store), [("a".to_string(), 2)]);
    }

    #[test]
    fn test_add_new_product_appends() {
        let mut store = CartStore::new();
        store.add_product(product("a"));
        store.add_product(product("a"));
        store.add_product(product("b"));

        assert_eq!(
            summary(&store),
            [("a".to_string(), 2), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn test_reset_empties_cart() {
        let mut store = CartStore::new();
        store.add_product(product("a"));
        store.add_product(product("a"));
        store.add_product(product("b"));

        store.reset_cart();
        assert!(store.items().is_empty());
        assert_eq!(store.state(), CartState::Empty);

        store.reset_cart();
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_increment_keeps_original_product_reference() {
        let first = Arc::new(product("a"));
        let mut store = CartStore::new();
        store.add_product(Arc::clone(&first));

        let mut renamed = product("a");
        renamed.name = "Renamed".to_string();
        store.add_product(renamed);

        assert!(Arc::ptr_eq(store.items()[0].product(), &first));
        assert_eq!(store.items()[0].quantity(), 2);
    }

    #[test]
    fn test_snapshot_is_unchanged_by_later_mutations() {
        let mut store = CartStore::new();
        store.add_product(product("a"));
        let before = store.snapshot();

        store.add_product(product("a"));
        store.add_product(product("b"));

        assert_eq!(before.len(), 1);
        assert_eq!(before.items()[0].quantity(), 1);
        assert_eq!(store.cart().len(), 2);
    }

    #[test]
    fn test_untouched_lines_are_shared() {
        let mut store = CartStore::new();
        store.add_product(product("a"));
        store.add_product(product("b"));
        let before = store.snapshot();

        store.add_product(product("b"));

        let after = store.cart();
        assert!(Arc::ptr_eq(&before.items()[0], &after.items()[0]));
        assert!(!Arc::ptr_eq(&before.items()[1], &after.items()[1]));
    }

    #[test]
    fn test_blank_id_is_always_appended() {
        let mut store = CartStore::new();
        store.add_product(product(""));
        store.add_product(product(""));
        store.add_product(product("  "));

        assert_eq!(store.items().len(), 3);
        assert!(store.items().iter().all(|line| line.quantity() == 1));
        assert!(store.cart().line_for(&ProductId::new("")).is_none());
    }

    #[test]
    fn test_totals() {
        let mut store = CartStore::new();
        assert_eq!(store.cart().subtotal(), None);

        store.add_product(Product::new("a", "A", usd(1999)));
        store.add_product(Product::new("a", "A", usd(1999)));
        store.add_product(Product::new("b", "B", usd(500)));

        assert_eq!(store.cart().total_quantity(), 3);
        assert_eq!(store.cart().subtotal(), Some(usd(4498)));
        assert_eq!(
            store.cart().line_for(&ProductId::new("a")).unwrap().line_total(),
            Some(usd(3998))
        );
    }

    #[test]
    fn test_subtotal_mixed_currencies() {
        let mut store = CartStore::new();
        store.add_product(Product::new("a", "A", usd(100)));
        store.add_product(Product::new(
            "b",
            "B",
            Price::new(Decimal::ONE, CurrencyCode::EUR),
        ));

        assert_eq!(store.cart().subtotal(), None);
    }

    #[test]
    fn test_totals_overflow_is_none() {
        let huge = Price::new(Decimal::try_from(5e28).unwrap(), CurrencyCode::USD);

        let mut store = CartStore::new();
        store.add_product(Product::new("a", "A", huge));
        store.add_product(Product::new("b", "B", huge));
        assert_eq!(store.items()[0].line_total(), Some(huge));
        assert_eq!(store.cart().subtotal(), None);

        store.reset_cart();
        store.add_product(Product::new("a", "A", huge));
        store.add_product(Product::new("a", "A", huge));
        assert_eq!(store.items()[0].line_total(), None);
        assert_eq!(store.cart().subtotal(), None);
        assert_eq!(store.cart().total_quantity(), 2);
    }

    #[test]
    fn test_quantity_saturates() {
        let line = LineItem {
            product: Arc::new(product("a")),
            quantity: NonZeroU32::MAX,
        };
        assert_eq!(line.incremented().quantity(), u32::MAX);
    }
}
