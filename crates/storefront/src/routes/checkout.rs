//! Checkout route handler.
//!
//! Checkout snapshots the session cart into a persistent order, announces it
//! to the automation webhook, creates the payment transaction, and hands the
//! processor's redirect URL back to the client. The order reference is
//! assigned before the transaction exists - it is the only key the
//! processor's callbacks can return.

use axum::{Json, extract::State, http::HeaderMap};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use elida_core::{Email, OrderReference, ShippingMethod};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::models::order::{NewOrder, ShippingDetails};
use crate::routes::cart::{load_cart, save_cart};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub shipping: ShippingRequest,
}

/// Shipping details as submitted by the client.
#[derive(Debug, Deserialize)]
pub struct ShippingRequest {
    pub method: ShippingMethod,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub phone: String,
}

/// Checkout response body.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub reference: OrderReference,
    pub redirect_url: String,
}

/// Perform checkout: persist the order and create the payment transaction.
#[instrument(skip(state, session, headers, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_owned()));
    }

    let email = Email::parse(&request.email)
        .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;
    let shipping = validate_shipping(request.shipping, &email, state.config().shipping_flat_fee)?;

    let items = cart.to_order_items();
    let total = NewOrder::computed_total(&items, shipping.cost);
    let reference = OrderReference::generate();

    let repo = OrderRepository::new(state.pool());
    let order = repo
        .create(NewOrder {
            reference: reference.clone(),
            user_id: request.user_id,
            email,
            items,
            total,
            shipping,
        })
        .await?;
    info!(reference = %order.reference, total = %order.total, "order created");

    // Announce the order. A broken automation endpoint must not block the
    // customer from paying.
    if let Err(e) = state.automation().send_new_order(&order).await {
        warn!(reference = %order.reference, error = %e, "NEW_ORDER announcement failed");
    }

    let created = state
        .payment()
        .create_transaction(&order, client_ip(&headers).as_deref())
        .await?;

    repo.mark_pending(&order.reference).await?;

    let mut cart = cart;
    cart.clear();
    save_cart(&session, &cart).await?;

    info!(
        reference = %order.reference,
        transaction_id = %created.transaction_id,
        "payment transaction created, redirecting customer"
    );

    Ok(Json(CheckoutResponse {
        reference,
        redirect_url: created.redirect_url,
    }))
}

/// Validate shipping details against the chosen method.
///
/// Address fields are required for home delivery and dropped entirely for
/// pickup; the flat shipping fee applies only to home delivery.
fn validate_shipping(
    request: ShippingRequest,
    email: &Email,
    flat_fee: Decimal,
) -> Result<ShippingDetails> {
    let details = match request.method {
        ShippingMethod::Shipping => {
            let address = required(request.address, "shipping.address")?;
            let city = required(request.city, "shipping.city")?;
            let postal_code = required(request.postal_code, "shipping.postal_code")?;
            ShippingDetails {
                method: ShippingMethod::Shipping,
                name: request.name,
                address: Some(address),
                city: Some(city),
                postal_code: Some(postal_code),
                email: email.clone(),
                phone: request.phone,
                cost: flat_fee,
            }
        }
        ShippingMethod::Pickup => ShippingDetails {
            method: ShippingMethod::Pickup,
            name: request.name,
            address: None,
            city: None,
            postal_code: None,
            email: email.clone(),
            phone: request.phone,
            cost: Decimal::ZERO,
        },
    };

    Ok(details)
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required field: {field}")))
}

/// Best-effort client IP for the payment request, from the proxy header.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("pirkejas@example.lt").unwrap()
    }

    fn shipping_request(method: ShippingMethod) -> ShippingRequest {
        ShippingRequest {
            method,
            name: "Jonas".to_owned(),
            address: Some("Gedimino pr. 1".to_owned()),
            city: Some("Vilnius".to_owned()),
            postal_code: Some("01103".to_owned()),
            phone: "+37060000000".to_owned(),
        }
    }

    #[test]
    fn test_validate_shipping_applies_flat_fee() {
        let details = validate_shipping(
            shipping_request(ShippingMethod::Shipping),
            &email(),
            Decimal::new(399, 2),
        )
        .unwrap();
        assert_eq!(details.cost, Decimal::new(399, 2));
        assert_eq!(details.address.as_deref(), Some("Gedimino pr. 1"));
    }

    #[test]
    fn test_validate_shipping_requires_address_fields() {
        let mut request = shipping_request(ShippingMethod::Shipping);
        request.city = None;
        let result = validate_shipping(request, &email(), Decimal::ZERO);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_validate_pickup_drops_address_and_fee() {
        let details = validate_shipping(
            shipping_request(ShippingMethod::Pickup),
            &email(),
            Decimal::new(399, 2),
        )
        .unwrap();
        assert_eq!(details.cost, Decimal::ZERO);
        assert!(details.address.is_none());
        assert!(details.city.is_none());
        assert!(details.postal_code.is_none());
    }

    #[test]
    fn test_client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));
        assert!(client_ip(&HeaderMap::new()).is_none());
    }
}
