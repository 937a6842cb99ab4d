//! Shopping cart store.

use std::sync::Arc;

use tracing::debug;

use crate::domain::entities::{CartItem, CartProduct};
use crate::domain::ports::KeyValuePort;

use super::persistent_list::{ListItem, PersistentList};

/// Local storage key holding the cart.
pub const CART_STORAGE_KEY: &str = "cart";

impl ListItem for CartItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_valid(&self) -> bool {
        self.quantity >= 1
    }
}

/// Cart state shared by the shop and checkout. Quantities never drop to
/// zero; such lines are removed instead.
#[derive(Debug)]
pub struct CartStore {
    items: PersistentList<CartItem>,
}

impl CartStore {
    /// Loads the cart from storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValuePort>) -> Self {
        Self {
            items: PersistentList::load(CART_STORAGE_KEY, storage),
        }
    }

    /// Adds one unit of `product`. Returns the line's new quantity.
    pub fn add(&self, product: CartProduct) -> u32 {
        self.items.update(|items| {
            if let Some(existing) = items.iter_mut().find(|i| i.id == product.id) {
                existing.quantity = existing.quantity.saturating_add(1);
                debug!(id = %existing.id, quantity = existing.quantity, "Incremented cart line");
                existing.quantity
            } else {
                debug!(id = %product.id, "Added cart line");
                items.push(CartItem::from_product(product));
                1
            }
        })
    }

    /// Removes the line with `id`. Returns true if it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.items.update(|items| {
            let before = items.len();
            items.retain(|i| i.id != id);
            items.len() != before
        })
    }

    /// Sets the quantity of a line; zero removes it. Returns true if the
    /// line existed.
    pub fn update_quantity(&self, id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(id);
        }
        self.items.update(|items| match items.iter_mut().find(|i| i.id == id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        })
    }

    /// Empties the cart.
    pub fn clear(&self) {
        self.items.update(Vec::clear);
    }

    /// Returns the cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.items.snapshot()
    }

    /// Total number of units.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.snapshot().iter().map(|i| i.quantity).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.items.snapshot().iter().map(CartItem::subtotal).sum()
    }

    /// Returns true if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adopts a cart written by another tab.
    pub fn on_storage_event(&self, key: &str, new_value: Option<&str>) -> bool {
        self.items.on_storage_event(key, new_value)
    }
}
