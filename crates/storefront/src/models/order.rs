//! Order records.
//!
//! An order is a denormalized snapshot taken at checkout: line items are
//! copied out of the cart so historical orders stay stable even when the
//! catalog changes later. Orders are created once, merge-updated by the
//! webhook receiver, and never deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use elida_core::{Email, OrderReference, OrderStatus, ProcessorStatus, ShippingMethod};

/// One ordered line item, snapshotted from the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog identifier of the product or subscription tier.
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    /// Line total (unit price times quantity).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Shipping or pickup details captured at checkout.
///
/// Address fields are only present when `method` is [`ShippingMethod::Shipping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub method: ShippingMethod,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub email: Email,
    pub phone: String,
    /// Flat shipping fee applied to this order; zero for pickup.
    #[serde(default)]
    pub cost: Decimal,
}

/// Payment sub-record attached once the processor reports an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayment {
    pub transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    /// The processor's verbatim status for this payment attempt.
    pub status: ProcessorStatus,
    pub processed_at: DateTime<Utc>,
}

/// A stored order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Unique correlation key shared with the payment processor.
    pub reference: OrderReference,
    /// Identifier of the customer in the SPA's auth provider, if known.
    pub user_id: Option<String>,
    pub email: Email,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub shipping: ShippingDetails,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<OrderPayment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to create an order; the repository assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub reference: OrderReference,
    pub user_id: Option<String>,
    pub email: Email,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub shipping: ShippingDetails,
}

impl NewOrder {
    /// Sum of line totals plus the shipping fee.
    #[must_use]
    pub fn computed_total(items: &[OrderItem], shipping_cost: Decimal) -> Decimal {
        items.iter().map(OrderItem::total).sum::<Decimal>() + shipping_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("test@example.com").expect("valid email")
    }

    #[test]
    fn test_item_total() {
        let item = OrderItem {
            id: "3".to_owned(),
            name: "Soliariumo kremas".to_owned(),
            price: Decimal::new(990, 2),
            quantity: 3,
        };
        assert_eq!(item.total(), Decimal::new(2970, 2));
    }

    #[test]
    fn test_computed_total_includes_shipping() {
        let items = vec![
            OrderItem {
                id: "1".to_owned(),
                name: "A".to_owned(),
                price: Decimal::new(1000, 2),
                quantity: 2,
            },
            OrderItem {
                id: "2".to_owned(),
                name: "B".to_owned(),
                price: Decimal::new(550, 2),
                quantity: 1,
            },
        ];
        let total = NewOrder::computed_total(&items, Decimal::new(399, 2));
        assert_eq!(total, Decimal::new(2949, 2));
    }

    #[test]
    fn test_pickup_shipping_serializes_without_address() {
        let shipping = ShippingDetails {
            method: ShippingMethod::Pickup,
            name: "Jonas Jonaitis".to_owned(),
            address: None,
            city: None,
            postal_code: None,
            email: email(),
            phone: "+37060000000".to_owned(),
            cost: Decimal::ZERO,
        };
        let json = serde_json::to_value(&shipping).expect("serialize");
        assert!(json.get("address").is_none());
        assert!(json.get("city").is_none());
        assert!(json.get("postal_code").is_none());
        assert_eq!(json["method"], "pickup");
    }
}
