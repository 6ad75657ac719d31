//! Marketing-automation webhook client.
//!
//! Forwards order events to the automation platform that sends transactional
//! email. The endpoint URL itself is the secret (it carries a secret path
//! segment); there is no other authentication, and no response body is
//! consumed beyond success or failure.
//!
//! Delivery is not idempotent at the receiving end: a replayed event sends a
//! duplicate email. Retries here cover transport errors only.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

use elida_core::ShippingMethod;

use crate::models::order::Order;

/// Request timeout for webhook deliveries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport-level retries per delivery (beyond the first attempt).
const MAX_RETRIES: u32 = 2;

/// Base delay between retries, doubled per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Errors that can occur when delivering an automation event.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// HTTP transport failed (after retries).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The automation endpoint answered with a non-success status.
    #[error("webhook delivery failed: {status} - {body}")]
    DeliveryFailed { status: u16, body: String },

    /// Client construction failed.
    #[error("client setup error: {0}")]
    Setup(String),
}

/// Client for the marketing-automation webhook.
#[derive(Clone)]
pub struct AutomationClient {
    client: reqwest::Client,
    webhook_url: SecretString,
}

impl AutomationClient {
    /// Create a new automation webhook client.
    ///
    /// # Errors
    ///
    /// Returns `AutomationError::Setup` if the HTTP client fails to build.
    pub fn new(webhook_url: SecretString) -> Result<Self, AutomationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AutomationError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Announce a freshly placed order (checkout time, before payment).
    ///
    /// # Errors
    ///
    /// Returns `AutomationError` if delivery fails after retries.
    pub async fn send_new_order(&self, order: &Order) -> Result<(), AutomationError> {
        let payload = new_order_payload(order);
        self.deliver(&payload).await
    }

    /// Announce a confirmed (paid) order for email delivery.
    ///
    /// # Errors
    ///
    /// Returns `AutomationError` if delivery fails after retries.
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<(), AutomationError> {
        let payload = order_confirmation_payload(order);
        self.deliver(&payload).await
    }

    /// Forward a processor webhook payload enriched with the stored order.
    ///
    /// # Errors
    ///
    /// Returns `AutomationError` if delivery fails after retries.
    pub async fn forward_enriched(
        &self,
        processor_payload: &serde_json::Value,
        order: &Order,
    ) -> Result<(), AutomationError> {
        let payload = enriched_payload(processor_payload, order);
        self.deliver(&payload).await
    }

    /// POST a payload with bounded retry on transport errors.
    async fn deliver(&self, payload: &serde_json::Value) -> Result<(), AutomationError> {
        let url = self.webhook_url.expose_secret();
        let mut attempt = 0;

        let response = loop {
            match self.client.post(url).json(payload).send().await {
                Ok(response) => break response,
                Err(e) if attempt < MAX_RETRIES => {
                    let delay = RETRY_BASE_DELAY * 2_u32.pow(attempt);
                    warn!(attempt, error = %e, "automation delivery transport error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(AutomationError::Http(e)),
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AutomationError::DeliveryFailed {
                status: status.as_u16(),
                body,
            });
        }

        debug!("automation event delivered");
        Ok(())
    }
}

/// Customer block shared by the event payloads. Shipped orders carry an
/// address object; pickup orders the literal marker string.
fn customer_block(order: &Order) -> serde_json::Value {
    let address = if order.shipping.method == ShippingMethod::Shipping {
        serde_json::json!({
            "street": order.shipping.address.as_deref().unwrap_or_default(),
            "city": order.shipping.city.as_deref().unwrap_or_default(),
            "postalCode": order.shipping.postal_code.as_deref().unwrap_or_default(),
            "country": "LT",
        })
    } else {
        serde_json::json!("Pickup in store")
    };

    serde_json::json!({
        "name": order.shipping.name,
        "email": order.email.as_str(),
        "phone": order.shipping.phone,
        "address": address,
    })
}

/// Build the `NEW_ORDER` event payload.
fn new_order_payload(order: &Order) -> serde_json::Value {
    let items: Vec<serde_json::Value> = order
        .items
        .iter()
        .map(|item| {
            serde_json::json!({
                "name": item.name,
                "quantity": item.quantity,
                "price": item.price,
                "total": item.total(),
            })
        })
        .collect();

    serde_json::json!({
        "type": "NEW_ORDER",
        "order": {
            "reference": order.reference.as_str(),
            "customer": customer_block(order),
            "items": items,
            "shipping": {
                "method": order.shipping.method,
                "cost": order.shipping.cost,
            },
            "payment": {
                "total": order.total,
                "currency": "EUR",
                "status": order.status,
            },
            "createdAt": order.created_at,
        },
    })
}

/// Build the `ORDER_CONFIRMATION` event payload (paid order, with its
/// payment sub-record).
fn order_confirmation_payload(order: &Order) -> serde_json::Value {
    serde_json::json!({
        "type": "ORDER_CONFIRMATION",
        "reference": order.reference.as_str(),
        "order": order,
    })
}

/// Merge the processor's webhook fields with the stored order.
fn enriched_payload(processor_payload: &serde_json::Value, order: &Order) -> serde_json::Value {
    let mut payload = processor_payload.clone();
    if let Some(map) = payload.as_object_mut() {
        map.insert("order".to_owned(), serde_json::json!(order));
    }
    payload
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use elida_core::{Email, OrderReference, OrderStatus, ProcessorStatus};

    use crate::models::order::{OrderItem, OrderPayment, ShippingDetails};

    fn pickup_order() -> Order {
        Order {
            id: Uuid::new_v4(),
            reference: OrderReference::from("ORD-42"),
            user_id: Some("user-1".to_owned()),
            email: Email::parse("pirkejas@example.lt").unwrap(),
            items: vec![OrderItem {
                id: "3".to_owned(),
                name: "Abonementas 100 min".to_owned(),
                price: Decimal::new(3500, 2),
                quantity: 2,
            }],
            total: Decimal::new(7000, 2),
            shipping: ShippingDetails {
                method: ShippingMethod::Pickup,
                name: "Jonas Jonaitis".to_owned(),
                address: None,
                city: None,
                postal_code: None,
                email: Email::parse("pirkejas@example.lt").unwrap(),
                phone: "+37060000000".to_owned(),
                cost: Decimal::ZERO,
            },
            status: OrderStatus::Pending,
            payment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_order_payload_shape() {
        let payload = new_order_payload(&pickup_order());
        assert_eq!(payload["type"], "NEW_ORDER");
        assert_eq!(payload["order"]["reference"], "ORD-42");
        assert_eq!(payload["order"]["customer"]["address"], "Pickup in store");
        assert_eq!(payload["order"]["items"][0]["quantity"], 2);
        assert_eq!(payload["order"]["payment"]["currency"], "EUR");
    }

    #[test]
    fn test_new_order_item_totals() {
        let payload = new_order_payload(&pickup_order());
        let item = &payload["order"]["items"][0];
        // Decimal serializes as its exact string form.
        assert_eq!(item["price"], "35.00");
        assert_eq!(item["total"], "70.00");
    }

    #[test]
    fn test_order_confirmation_includes_payment() {
        let mut order = pickup_order();
        order.status = OrderStatus::Completed;
        order.payment = Some(OrderPayment {
            transaction_id: "tx-9".to_owned(),
            amount: Decimal::new(7000, 2),
            currency: "EUR".to_owned(),
            status: ProcessorStatus::Completed,
            processed_at: Utc::now(),
        });

        let payload = order_confirmation_payload(&order);
        assert_eq!(payload["type"], "ORDER_CONFIRMATION");
        assert_eq!(payload["reference"], "ORD-42");
        assert_eq!(payload["order"]["payment"]["transaction_id"], "tx-9");
        assert_eq!(payload["order"]["status"], "completed");
    }

    #[test]
    fn test_enriched_payload_keeps_processor_fields() {
        let processor = serde_json::json!({
            "reference": "ORD-42",
            "status": "COMPLETED",
            "transaction": "tx-9",
        });
        let payload = enriched_payload(&processor, &pickup_order());
        assert_eq!(payload["status"], "COMPLETED");
        assert_eq!(payload["order"]["reference"], "ORD-42");
    }
}
