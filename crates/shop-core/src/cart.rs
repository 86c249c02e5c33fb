//! # Cart
//!
//! The session's cart aggregate. `CartStore` keeps one line item per product
//! id with a quantity of at least one; `CartHandle` serializes access when
//! several tasks share the same store.

use crate::product::{Currency, Price, Product};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// A line item in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product ID (unique within a cart)
    pub id: String,

    /// Product name (denormalized for display)
    pub name: String,

    /// Unit price
    pub unit_price: Price,

    /// Quantity, at least 1 while the item is in a cart
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Optional image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// Largest quantity a caller may set on one line item
pub const MAX_LINE_QUANTITY: u32 = 999;

impl LineItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity: 1,
            image_url: None,
        }
    }

    /// Create a single-unit line item from a catalog product
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            image_url: product.image_url.clone(),
        }
    }

    /// Builder: set quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Calculate the total price for this line item
    pub fn total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Immutable view of the cart, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,
    pub currency: Currency,
}

impl CartSnapshot {
    /// Sum of `unit_price × quantity` over all items
    pub fn total(&self) -> Price {
        sum_items(&self.items, self.currency)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all line items
    pub fn item_count(&self) -> u32 {
        count_units(&self.items)
    }

    /// Checkout is only offered for a non-empty cart with a positive total
    pub fn checkout_enabled(&self) -> bool {
        !self.is_empty() && self.total().amount > 0
    }

    /// `"name x qty"` for every item, joined with `", "`
    pub fn description(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{} x {}", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn sum_items(items: &[LineItem], currency: Currency) -> Price {
    let amount = items
        .iter()
        .fold(0_i64, |acc, item| acc.saturating_add(item.total().amount));
    Price::from_cents(amount, currency)
}

fn count_units(items: &[LineItem]) -> u32 {
    items
        .iter()
        .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
}

/// The authoritative cart for one shopping session
#[derive(Debug, Clone, PartialEq)]
pub struct CartStore {
    items: Vec<LineItem>,
    currency: Currency,
}

impl CartStore {
    /// Create an empty cart whose totals are expressed in `currency`
    pub fn new(currency: Currency) -> Self {
        Self {
            items: Vec::new(),
            currency,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Add one unit of `item`.
    ///
    /// An existing entry with the same id gains exactly one unit and the
    /// incoming quantity is ignored; each scan is "one more". A new entry keeps
    /// its own quantity, raised to 1 if it was 0.
    pub fn add(&mut self, item: LineItem) {
        if item.unit_price.currency != self.currency {
            warn!(
                "Line item {} priced in {} added to a {} cart",
                item.id, item.unit_price.currency, self.currency
            );
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            debug!("Incremented {} to {}", existing.id, existing.quantity);
            return;
        }

        let mut item = item;
        item.quantity = item.quantity.max(1);
        debug!("Added {} x {}", item.id, item.quantity);
        self.items.push(item);
    }

    /// Replace the quantity of an existing entry.
    ///
    /// Returns `false` and leaves the cart untouched when `id` is not in the
    /// cart. A quantity of 0 removes the entry; callers are expected to block
    /// that before it gets here.
    pub fn update_quantity(&mut self, id: &str, new_quantity: u32) -> bool {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            warn!("Quantity update for {} ignored: not in cart", id);
            return false;
        };

        if new_quantity == 0 {
            debug!("Quantity of {} set to 0, removing", id);
            self.items.remove(index);
        } else {
            self.items[index].quantity = new_quantity;
        }
        true
    }

    /// Remove the entry for `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        before != self.items.len()
    }

    /// Sum of `unit_price × quantity` over all entries
    pub fn total(&self) -> Price {
        sum_items(&self.items, self.currency)
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            currency: self.currency,
        }
    }

    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct line items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all line items
    pub fn item_count(&self) -> u32 {
        count_units(&self.items)
    }

    pub fn checkout_enabled(&self) -> bool {
        !self.is_empty() && self.total().amount > 0
    }
}

/// Shared, serialized access to a `CartStore`.
///
/// Every operation takes the lock for the duration of one synchronous call;
/// the lock is never held across an `.await`.
#[derive(Debug, Clone)]
pub struct CartHandle {
    inner: Arc<Mutex<CartStore>>,
}

impl CartHandle {
    pub fn new(store: CartStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartStore> {
        // No CartStore operation leaves it half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, item: LineItem) {
        self.lock().add(item)
    }

    pub fn update_quantity(&self, id: &str, new_quantity: u32) -> bool {
        self.lock().update_quantity(id, new_quantity)
    }

    pub fn remove(&self, id: &str) -> bool {
        self.lock().remove(id)
    }

    pub fn total(&self) -> Price {
        self.lock().total()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.lock().snapshot()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    /// Increment the entry for `id` if present. Returns the updated item.
    pub fn increment_existing(&self, id: &str) -> Option<LineItem> {
        let mut store = self.lock();
        let existing = store.get(id)?.clone();
        store.add(existing);
        store.get(id).cloned()
    }

    /// Add `item` and return the entry as it now stands
    pub fn add_and_get(&self, item: LineItem) -> LineItem {
        let mut store = self.lock();
        let fallback = item.clone();
        store.add(item);
        store.get(&fallback.id).cloned().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(amount: f64) -> Price {
        Price::new(amount, Currency::USD)
    }

    fn item(id: &str, price: f64) -> LineItem {
        LineItem::new(id, id, usd(price))
    }

    #[test]
    fn test_line_item_total() {
        let item = item("P1", 10.0).with_quantity(3);
        assert_eq!(item.total().amount, 3000);
    }

    #[test]
    fn test_add_same_id_twice_merges() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 10.0));
        cart.add(item("P1", 10.0));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("P1").unwrap().quantity, 2);
        assert_eq!(cart.total(), usd(20.0));
    }

    #[test]
    fn test_repeated_adds_count_units_not_incoming_quantity() {
        let mut cart = CartStore::new(Currency::USD);
        for _ in 0..7 {
            cart.add(item("P1", 1.0).with_quantity(5));
        }

        // First add keeps its own quantity; every later add is one more unit
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("P1").unwrap().quantity, 5 + 6);

        let mut cart = CartStore::new(Currency::USD);
        for _ in 0..7 {
            cart.add(item("P2", 1.0));
        }
        assert_eq!(cart.get("P2").unwrap().quantity, 7);
    }

    #[test]
    fn test_add_zero_quantity_is_raised_to_one() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 2.0).with_quantity(0));
        assert_eq!(cart.get("P1").unwrap().quantity, 1);
    }

    #[test]
    fn test_total_after_mixed_operations() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 10.0));
        cart.add(item("P2", 5.0));
        cart.add(item("P3", 0.5));
        cart.add(item("P1", 10.0));
        assert!(cart.update_quantity("P2", 4));
        assert!(cart.remove("P3"));
        cart.add(item("P3", 0.5).with_quantity(3));

        let expected: i64 = cart
            .snapshot()
            .items
            .iter()
            .map(|i| i.unit_price.amount * i.quantity as i64)
            .sum();
        assert_eq!(cart.total().amount, expected);
        assert_eq!(cart.total(), usd(20.0 + 20.0 + 1.5));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 10.0));
        cart.add(item("P2", 5.0));

        assert!(cart.remove("P1"));
        let after_first = cart.clone();
        assert!(!cart.remove("P1"));
        assert_eq!(cart, after_first);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 10.0));
        let before = cart.clone();

        assert!(!cart.update_quantity("missing", 3));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_to_zero_removes_entry() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 10.0));
        cart.add(item("P2", 5.0));

        assert!(cart.update_quantity("P1", 0));
        assert!(!cart.contains("P1"));
        assert_eq!(cart.len(), 1);
        assert!(cart.snapshot().items.iter().all(|i| i.quantity >= 1));
    }

    #[test]
    fn test_snapshot_keeps_insertion_order() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("B", 1.0));
        cart.add(item("A", 1.0));
        cart.add(item("C", 1.0));
        cart.add(item("A", 1.0));

        let ids: Vec<_> = cart.snapshot().items.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_snapshot_description() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 10.0).with_quantity(2));
        cart.add(item("P2", 5.0));

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.description(), "P1 x 2, P2 x 1");
        assert_eq!(snapshot.total(), usd(25.0));
        assert_eq!(snapshot.item_count(), 3);
    }

    #[test]
    fn test_checkout_enabled() {
        let mut cart = CartStore::new(Currency::USD);
        assert!(!cart.checkout_enabled());

        cart.add(item("FREE", 0.0));
        assert!(!cart.checkout_enabled());

        cart.add(item("P1", 1.0));
        assert!(cart.checkout_enabled());
    }

    #[test]
    fn test_handle_increment_existing() {
        let handle = CartHandle::new(CartStore::new(Currency::USD));
        assert!(handle.increment_existing("P1").is_none());

        handle.add(item("P1", 3.0));
        let updated = handle.increment_existing("P1").unwrap();
        assert_eq!(updated.quantity, 2);
        assert_eq!(handle.total(), usd(6.0));
    }

    #[test]
    fn test_handle_serializes_concurrent_adds() {
        let handle = CartHandle::new(CartStore::new(Currency::USD));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        handle.add(item("P1", 1.0));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 200);
    }

    #[test]
    fn test_increment_saturates_at_max_quantity() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 10.0));
        assert!(cart.update_quantity("P1", u32::MAX));

        cart.add(item("P1", 10.0));
        assert_eq!(cart.get("P1").unwrap().quantity, u32::MAX);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_item_count_saturates() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(item("P1", 1.0).with_quantity(3_000_000_000));
        cart.add(item("P2", 1.0).with_quantity(3_000_000_000));

        assert_eq!(cart.item_count(), u32::MAX);
        assert_eq!(cart.snapshot().item_count(), u32::MAX);
    }

    #[test]
    fn test_total_saturates_on_huge_prices() {
        let mut cart = CartStore::new(Currency::USD);
        cart.add(LineItem::new("P1", "P1", Price::from_cents(i64::MAX / 2, Currency::USD)).with_quantity(3));
        cart.add(LineItem::new("P2", "P2", Price::from_cents(i64::MAX, Currency::USD)));

        assert_eq!(cart.total().amount, i64::MAX);
        assert_eq!(cart.snapshot().total().amount, i64::MAX);
    }
}
