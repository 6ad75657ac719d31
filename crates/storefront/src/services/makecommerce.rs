//! MakeCommerce payment API client.
//!
//! Creates payment transactions and redirects the customer to the processor's
//! hosted payment page. Transaction creation is a two-call sequence: the
//! transaction is created first, then patched with return/cancel/notification
//! URLs that embed both the order reference and the freshly assigned
//! transaction id - so the webhook receiver can correlate a notification
//! without a side lookup.
//!
//! Authentication is HTTP Basic with `base64(store_id:secret_key)`.
//! Credentials come from configuration; startup fails without them.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use elida_core::ShippingMethod;

use crate::config::MakeCommerceConfig;
use crate::models::order::Order;

/// Request timeout for payment API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport-level retries per call (beyond the first attempt).
const MAX_RETRIES: u32 = 2;

/// Base delay between retries, doubled per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Errors that can occur when talking to the payment API.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP transport failed (after retries).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status. The processor's error
    /// body is attached for diagnosis.
    #[error("payment request failed: {status} - {body}")]
    RequestFailed { status: u16, body: String },

    /// The transaction response contained no redirect-style payment method.
    #[error("payment response contained no redirect URL")]
    MissingRedirectUrl,

    /// Client construction failed.
    #[error("client setup error: {0}")]
    Setup(String),
}

/// A successfully created transaction, ready for customer redirect.
#[derive(Debug, Clone)]
pub struct CreatedTransaction {
    /// Processor-assigned transaction id.
    pub transaction_id: String,
    /// Hosted payment page to redirect the customer to.
    pub redirect_url: String,
}

/// Transaction details fetched from the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDetails {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Transaction create/update response body.
#[derive(Debug, Deserialize)]
struct TransactionResponse {
    id: String,
    #[serde(default)]
    payment_methods: Option<PaymentMethods>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethods {
    #[serde(default)]
    other: Vec<PaymentMethodEntry>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodEntry {
    name: String,
    url: String,
}

/// Client for the MakeCommerce transactions API.
#[derive(Clone)]
pub struct MakeCommerceClient {
    client: reqwest::Client,
    api_url: String,
    /// Public base URL of this site; callback URLs are built from it.
    base_url: String,
}

impl MakeCommerceClient {
    /// Create a new payment API client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Setup` if the credentials cannot form a valid
    /// Authorization header or the HTTP client fails to build.
    pub fn new(config: &MakeCommerceConfig, base_url: &str) -> Result<Self, PaymentError> {
        let credentials = format!("{}:{}", config.store_id, config.secret_key.expose_secret());
        let auth_value = format!("Basic {}", BASE64.encode(credentials));

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentError::Setup(format!("invalid credentials: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaymentError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a payment transaction for an order and return the redirect URL.
    ///
    /// Call one creates the transaction from the order snapshot; call two
    /// attaches the callback URLs, which need the transaction id from call
    /// one. The redirect URL is taken from the `"redirect"` entry of the
    /// final response's payment methods.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::RequestFailed` with the processor's body on a
    /// non-2xx answer, or `PaymentError::MissingRedirectUrl` when the
    /// response carries no redirect entry. Callers must not assume partial
    /// success: a failed second call leaves no usable transaction.
    pub async fn create_transaction(
        &self,
        order: &Order,
        customer_ip: Option<&str>,
    ) -> Result<CreatedTransaction, PaymentError> {
        let create_body = transaction_create_body(order, customer_ip);
        let url = format!("{}/transactions", self.api_url);
        let created: TransactionResponse = self.post_json(&url, &create_body).await?;
        debug!(transaction_id = %created.id, reference = %order.reference, "transaction created");

        let update_body = transaction_urls_body(&self.base_url, order.reference.as_str(), &created.id);
        let url = format!("{}/transactions/{}", self.api_url, created.id);
        let updated: TransactionResponse = self.post_json(&url, &update_body).await?;

        let redirect_url = find_redirect_url(&updated)
            .or_else(|| find_redirect_url(&created))
            .ok_or(PaymentError::MissingRedirectUrl)?;

        Ok(CreatedTransaction {
            transaction_id: updated.id,
            redirect_url,
        })
    }

    /// Fetch transaction details by id.
    ///
    /// Conservative: any transport or API error is logged and yields `None`,
    /// so callers treat "verification unavailable" as "not completed".
    pub async fn fetch_transaction(&self, transaction_id: &str) -> Option<TransactionDetails> {
        let url = format!("{}/transactions/{transaction_id}", self.api_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(transaction_id, error = %e, "transaction fetch failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(transaction_id, status = status.as_u16(), body, "transaction fetch rejected");
            return None;
        }

        match response.json::<TransactionDetails>().await {
            Ok(details) => Some(details),
            Err(e) => {
                warn!(transaction_id, error = %e, "transaction response decode failed");
                None
            }
        }
    }

    /// Check whether a transaction has completed.
    ///
    /// Returns `false` when verification is unavailable for any reason.
    pub async fn verify_payment(&self, transaction_id: &str) -> bool {
        self.fetch_transaction(transaction_id)
            .await
            .is_some_and(|details| details.status == "completed" || details.status == "COMPLETED")
    }

    /// POST a JSON body with bounded retry on transport errors.
    ///
    /// Non-2xx responses are not retried: the processor saw the request, and
    /// replaying a create could mint a second transaction.
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, PaymentError> {
        let mut attempt = 0;
        let response = loop {
            match self.client.post(url).json(body).send().await {
                Ok(response) => break response,
                Err(e) if attempt < MAX_RETRIES => {
                    let delay = RETRY_BASE_DELAY * 2_u32.pow(attempt);
                    warn!(url, attempt, error = %e, "payment request transport error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(PaymentError::Http(e)),
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Build the transaction creation body from an order snapshot.
///
/// Amounts are fixed two-decimal strings and the currency is always EUR.
/// The customer address block is present only for shipped orders; pickup
/// orders carry no street/city/postal fields at all.
fn transaction_create_body(order: &Order, customer_ip: Option<&str>) -> serde_json::Value {
    let amount = format!("{:.2}", order.total);

    let mut customer = serde_json::json!({
        "email": order.email.as_str(),
        "country": "LT",
        "locale": "LT",
        "name": order.shipping.name,
        "phone": order.shipping.phone,
    });

    if let Some(ip) = customer_ip
        && let Some(map) = customer.as_object_mut()
    {
        map.insert("ip".to_owned(), serde_json::json!(ip));
    }

    if order.shipping.method == ShippingMethod::Shipping
        && let Some(map) = customer.as_object_mut()
    {
        map.insert(
            "address".to_owned(),
            serde_json::json!({
                "street": order.shipping.address.as_deref().unwrap_or_default(),
                "city": order.shipping.city.as_deref().unwrap_or_default(),
                "postal_code": order.shipping.postal_code.as_deref().unwrap_or_default(),
                "country": "LT",
            }),
        );
    }

    let items: Vec<serde_json::Value> = order
        .items
        .iter()
        .map(|item| {
            serde_json::json!({
                "name": item.name,
                "price": format!("{:.2}", item.price),
                "quantity": item.quantity,
            })
        })
        .collect();

    serde_json::json!({
        "transaction": {
            "amount": amount,
            "currency": "EUR",
            "reference": order.reference.as_str(),
            "merchant_data": format!("Order ID: {}", order.reference),
            "recurring_required": false,
        },
        "customer": customer,
        "order": {
            "reference": order.reference.as_str(),
            "amount": amount,
            "currency": "EUR",
            "items": items,
        },
    })
}

/// Build the callback-URL patch body for an existing transaction.
///
/// The notification URL embeds both the reference and the transaction id so
/// the webhook receiver never needs a lookup to correlate.
fn transaction_urls_body(
    base_url: &str,
    reference: &str,
    transaction_id: &str,
) -> serde_json::Value {
    serde_json::json!({
        "transaction": {
            "transaction_url": {
                "return_url": {
                    "url": format!("{base_url}/payment/return?reference={reference}"),
                    "method": "GET",
                },
                "cancel_url": {
                    "url": format!("{base_url}/payment-failed"),
                    "method": "GET",
                },
                "notification_url": {
                    "url": format!(
                        "{base_url}/api/payment-webhook?reference={reference}&transaction={transaction_id}"
                    ),
                    "method": "POST",
                },
            },
        },
    })
}

/// Pick the `"redirect"` entry out of a transaction's payment methods.
fn find_redirect_url(response: &TransactionResponse) -> Option<String> {
    response
        .payment_methods
        .as_ref()?
        .other
        .iter()
        .find(|method| method.name == "redirect")
        .map(|method| method.url.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use elida_core::{Email, OrderReference, OrderStatus};

    use crate::models::order::{OrderItem, ShippingDetails};

    fn order(method: ShippingMethod) -> Order {
        let address = (method == ShippingMethod::Shipping).then(|| "Gedimino pr. 1".to_owned());
        let city = (method == ShippingMethod::Shipping).then(|| "Vilnius".to_owned());
        let postal_code = (method == ShippingMethod::Shipping).then(|| "01103".to_owned());

        Order {
            id: Uuid::new_v4(),
            reference: OrderReference::from("ORD-42"),
            user_id: None,
            email: Email::parse("pirkejas@example.lt").unwrap(),
            items: vec![OrderItem {
                id: "3".to_owned(),
                name: "Soliariumo kremas".to_owned(),
                price: Decimal::new(990, 2),
                quantity: 3,
            }],
            total: Decimal::new(2970, 2),
            shipping: ShippingDetails {
                method,
                name: "Jonas Jonaitis".to_owned(),
                address,
                city,
                postal_code,
                email: Email::parse("pirkejas@example.lt").unwrap(),
                phone: "+37060000000".to_owned(),
                cost: Decimal::ZERO,
            },
            status: OrderStatus::Created,
            payment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_body_amounts_are_fixed_two_decimals() {
        let body = transaction_create_body(&order(ShippingMethod::Pickup), None);
        assert_eq!(body["transaction"]["amount"], "29.70");
        assert_eq!(body["transaction"]["currency"], "EUR");
        assert_eq!(body["order"]["items"][0]["price"], "9.90");
    }

    #[test]
    fn test_create_body_pickup_omits_address() {
        let body = transaction_create_body(&order(ShippingMethod::Pickup), None);
        let customer = body["customer"].as_object().unwrap();
        assert!(!customer.contains_key("address"));
        assert_eq!(customer["name"], "Jonas Jonaitis");
    }

    #[test]
    fn test_create_body_shipping_includes_address() {
        let body = transaction_create_body(&order(ShippingMethod::Shipping), None);
        assert_eq!(body["customer"]["address"]["street"], "Gedimino pr. 1");
        assert_eq!(body["customer"]["address"]["city"], "Vilnius");
        assert_eq!(body["customer"]["address"]["postal_code"], "01103");
        assert_eq!(body["customer"]["address"]["country"], "LT");
    }

    #[test]
    fn test_create_body_includes_ip_when_known() {
        let body = transaction_create_body(&order(ShippingMethod::Pickup), Some("203.0.113.9"));
        assert_eq!(body["customer"]["ip"], "203.0.113.9");
    }

    #[test]
    fn test_urls_body_embeds_reference_and_transaction() {
        let body = transaction_urls_body("https://elida.lt", "ORD-42", "tx-123");
        let urls = &body["transaction"]["transaction_url"];
        assert_eq!(
            urls["notification_url"]["url"],
            "https://elida.lt/api/payment-webhook?reference=ORD-42&transaction=tx-123"
        );
        assert_eq!(urls["notification_url"]["method"], "POST");
        assert_eq!(
            urls["return_url"]["url"],
            "https://elida.lt/payment/return?reference=ORD-42"
        );
        assert_eq!(urls["cancel_url"]["url"], "https://elida.lt/payment-failed");
    }

    #[test]
    fn test_find_redirect_url() {
        let response: TransactionResponse = serde_json::from_value(serde_json::json!({
            "id": "tx-1",
            "payment_methods": {
                "other": [
                    { "name": "banklink", "url": "https://bank.example/pay" },
                    { "name": "redirect", "url": "https://pay.example/tx-1" },
                ],
            },
        }))
        .unwrap();

        assert_eq!(
            find_redirect_url(&response).as_deref(),
            Some("https://pay.example/tx-1")
        );
    }

    #[test]
    fn test_find_redirect_url_absent() {
        let response: TransactionResponse =
            serde_json::from_value(serde_json::json!({ "id": "tx-1" })).unwrap();
        assert!(find_redirect_url(&response).is_none());
    }
}
