//! Session-resident shopping cart.
//!
//! The cart lives in the server session rather than a process-global store,
//! so its lifecycle is tied to the session. Handlers read it from the
//! session, mutate it, and write it back; the session layer persists it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::order::OrderItem;

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog identifier (product or subscription tier).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    pub quantity: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sku: String,
}

/// The shopping cart for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add a line to the cart. A line with the same id already present has
    /// its quantity incremented by the added quantity instead of producing a
    /// duplicate entry.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.id == line.id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity.max(1));
        } else {
            let mut line = line;
            line.quantity = line.quantity.max(1);
            self.lines.push(line);
        }
    }

    /// Set the quantity for a line. A quantity of zero removes the line.
    pub fn update_quantity(&mut self, id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
        } else if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line by id. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: &str) {
        self.lines.retain(|l| l.id != id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals, before shipping.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Snapshot the cart into order line items.
    #[must_use]
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|l| OrderItem {
                id: l.id.clone(),
                name: l.name.clone(),
                price: l.price,
                quantity: l.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            id: id.to_owned(),
            name: format!("Item {id}"),
            description: String::new(),
            price: Decimal::new(price, 2),
            image_url: String::new(),
            quantity,
            category: String::new(),
            sku: String::new(),
        }
    }

    #[test]
    fn test_add_same_id_aggregates_quantity() {
        let mut cart = Cart::default();
        cart.add(line("1", 1000, 1));
        cart.add(line("1", 1000, 2));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_add_different_ids_appends() {
        let mut cart = Cart::default();
        cart.add(line("1", 1000, 1));
        cart.add(line("2", 500, 1));
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let mut cart = Cart::default();
        cart.add(line("1", 1000, 0));
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::default();
        cart.add(line("1", 1000, 1));
        cart.update_quantity("1", 5);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add(line("1", 1000, 2));
        cart.update_quantity("1", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut cart = Cart::default();
        cart.add(line("1", 1000, 1));
        cart.remove("99");
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_subtotal() {
        let mut cart = Cart::default();
        cart.add(line("1", 990, 3));
        cart.add(line("2", 2000, 1));
        assert_eq!(cart.subtotal(), Decimal::new(4970, 2));
    }

    #[test]
    fn test_to_order_items_snapshot() {
        let mut cart = Cart::default();
        cart.add(line("1", 990, 2));
        let items = cart.to_order_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, Decimal::new(990, 2));
    }
}
