//! Domain models for the storefront.

pub mod cart;
pub mod order;

pub use cart::{Cart, CartLine};
pub use order::{NewOrder, Order, OrderItem, OrderPayment, ShippingDetails};

/// Session keys used across handlers.
pub mod session_keys {
    /// The shopping cart for the active session.
    pub const CART: &str = "cart";
}
