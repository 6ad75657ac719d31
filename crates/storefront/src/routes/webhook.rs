//! Payment callback handlers.
//!
//! Two call shapes arrive here:
//!
//! - The processor POSTs `/api/payment-webhook` directly (server push).
//!   Invalid payloads get 400, unknown references 404; the receiver never
//!   creates an order from webhook data. After the merge the enriched
//!   payload is forwarded to the automation webhook; a forwarding failure is
//!   logged but the contracted 200 is still returned - the payment outcome
//!   is already durable at that point.
//! - The customer's browser returns via `GET /payment/return` with the
//!   outcome in query parameters. This path must never surface an error:
//!   every failure is logged and the customer is redirected to the landing
//!   page the outcome calls for.
//!
//! Replaying a webhook re-applies the same merge and ends in the same state.
//! The automation forward is not replay-safe (duplicate email); see DESIGN.md.

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use elida_core::{OrderReference, OrderStatus, ProcessorStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::models::order::{Order, OrderPayment};
use crate::state::AppState;

/// Query parameters the processor appends to the notification URL.
#[derive(Debug, Deserialize, Default)]
pub struct WebhookQuery {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
}

/// Query parameters on the customer's return redirect.
#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

/// Validated webhook fields extracted from a raw payload.
struct WebhookFields {
    reference: OrderReference,
    status: ProcessorStatus,
    transaction_id: String,
    amount: Decimal,
    currency: String,
}

/// Extract and validate the required webhook fields.
///
/// `reference` and `status` must be present; the transaction id may come
/// from the body or from the notification URL's query parameters (the URL
/// embeds it at transaction-creation time).
fn parse_webhook(
    payload: &serde_json::Value,
    query: &WebhookQuery,
) -> std::result::Result<WebhookFields, String> {
    let reference = payload
        .get("reference")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .or_else(|| query.reference.clone())
        .filter(|r| !r.is_empty())
        .ok_or("missing reference")?;

    let status = payload
        .get("status")
        .and_then(serde_json::Value::as_str)
        .ok_or("missing status")?
        .parse::<ProcessorStatus>()
        .map_err(|e| e.to_string())?;

    let transaction_id = payload
        .get("transaction")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .or_else(|| query.transaction.clone())
        .unwrap_or_default();

    let amount = payload
        .get("amount")
        .map(parse_amount)
        .unwrap_or_default();
    let currency = payload
        .get("currency")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("EUR")
        .to_owned();

    Ok(WebhookFields {
        reference: OrderReference::from_string(reference),
        status,
        transaction_id,
        amount,
        currency,
    })
}

/// Amounts arrive as numbers or strings depending on the path.
fn parse_amount(raw: &serde_json::Value) -> Decimal {
    match raw {
        serde_json::Value::Number(n) => n.to_string().parse().unwrap_or_default(),
        serde_json::Value::String(s) => s.parse().unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

/// Merge the payment outcome onto the stored order.
///
/// Returns `Ok(None)` when no order matches the reference.
async fn apply_outcome(
    state: &AppState,
    fields: &WebhookFields,
) -> std::result::Result<Option<Order>, crate::db::RepositoryError> {
    let payment = OrderPayment {
        transaction_id: fields.transaction_id.clone(),
        amount: fields.amount,
        currency: fields.currency.clone(),
        status: fields.status,
        processed_at: Utc::now(),
    };

    OrderRepository::new(state.pool())
        .apply_payment(&fields.reference, &payment)
        .await
}

/// Handle a server-pushed processor notification.
#[instrument(skip(state, payload))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>> {
    let fields = parse_webhook(&payload, &query).map_err(|reason| {
        warn!(reason, %payload, "invalid webhook payload");
        AppError::BadRequest("Invalid webhook data".to_owned())
    })?;

    let order = apply_outcome(&state, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    info!(
        reference = %order.reference,
        status = %fields.status,
        "order updated from payment webhook"
    );

    // The merge is durable; a broken automation endpoint is not worth a 500
    // that would only make the processor retry into the same failure.
    if let Err(e) = state.automation().forward_enriched(&payload, &order).await {
        error!(reference = %order.reference, error = %e, "webhook forward failed");
    }

    Ok(Json(serde_json::json!({
        "message": "Webhook processed successfully"
    })))
}

/// Handle the customer returning from the payment page.
///
/// Infallible by contract: whatever goes wrong is logged and the customer
/// still lands on a result page.
#[instrument(skip(state, session, query))]
pub async fn payment_return(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ReturnQuery>,
) -> Redirect {
    let base = state.config().base_url.clone();
    let failed = Redirect::to(&format!("{base}/payment-failed"));

    let (Some(reference), Some(raw_status)) = (query.reference.clone(), query.status.clone())
    else {
        warn!(?query, "payment return missing reference or status");
        return failed;
    };

    let Ok(mut status) = raw_status.parse::<ProcessorStatus>() else {
        warn!(reference, raw_status, "payment return with unknown status");
        return failed;
    };

    // A customer can outrun the processor's own notification. When the
    // redirect still says PENDING, ask the processor directly before
    // settling on a non-completed state.
    if status == ProcessorStatus::Pending
        && let Some(transaction_id) = query.transaction.as_deref()
        && state.payment().verify_payment(transaction_id).await
    {
        status = ProcessorStatus::Completed;
    }

    let fields = WebhookFields {
        reference: OrderReference::from_string(reference),
        status,
        transaction_id: query.transaction.clone().unwrap_or_default(),
        amount: query.amount.as_ref().map(parse_amount).unwrap_or_default(),
        currency: query.currency.clone().unwrap_or_else(|| "EUR".to_owned()),
    };

    let order = match apply_outcome(&state, &fields).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            warn!(reference = %fields.reference, "payment return for unknown order");
            return failed;
        }
        Err(e) => {
            error!(reference = %fields.reference, error = %e, "payment return update failed");
            return failed;
        }
    };

    // The merge never downgrades a settled order, so the stored status is
    // the authority here, not the redirect's query parameter.
    if order.status == OrderStatus::Completed {
        if let Err(e) = state.automation().send_order_confirmation(&order).await {
            error!(reference = %order.reference, error = %e, "ORDER_CONFIRMATION failed");
        }

        // Checkout already clears the cart; this covers carts rebuilt while
        // the customer was on the payment page.
        if let Err(e) = session
            .remove::<crate::models::Cart>(crate::models::session_keys::CART)
            .await
        {
            warn!(error = %e, "cart clear on return failed");
        }

        info!(reference = %order.reference, "payment completed");
        return Redirect::to(&format!(
            "{base}/payment-success?reference={}",
            order.reference
        ));
    }

    info!(reference = %order.reference, status = %status, "payment not completed");
    failed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_webhook_valid() {
        let payload = serde_json::json!({
            "reference": "ORD-42",
            "status": "COMPLETED",
            "transaction": "tx-1",
            "amount": 29.70,
            "currency": "EUR",
        });
        let fields = parse_webhook(&payload, &WebhookQuery::default()).unwrap();
        assert_eq!(fields.reference.as_str(), "ORD-42");
        assert_eq!(fields.status, ProcessorStatus::Completed);
        assert_eq!(fields.transaction_id, "tx-1");
        assert_eq!(fields.amount, Decimal::new(2970, 2));
    }

    #[test]
    fn test_parse_webhook_missing_status_rejected() {
        let payload = serde_json::json!({ "reference": "ORD-42" });
        assert!(parse_webhook(&payload, &WebhookQuery::default()).is_err());
    }

    #[test]
    fn test_parse_webhook_missing_reference_rejected() {
        let payload = serde_json::json!({ "status": "COMPLETED" });
        assert!(parse_webhook(&payload, &WebhookQuery::default()).is_err());
    }

    #[test]
    fn test_parse_webhook_unknown_status_rejected() {
        let payload = serde_json::json!({ "reference": "ORD-42", "status": "maybe" });
        assert!(parse_webhook(&payload, &WebhookQuery::default()).is_err());
    }

    #[test]
    fn test_parse_webhook_reference_from_query() {
        let payload = serde_json::json!({ "status": "PENDING" });
        let query = WebhookQuery {
            reference: Some("ORD-7".to_owned()),
            transaction: Some("tx-7".to_owned()),
        };
        let fields = parse_webhook(&payload, &query).unwrap();
        assert_eq!(fields.reference.as_str(), "ORD-7");
        assert_eq!(fields.transaction_id, "tx-7");
    }

    #[test]
    fn test_parse_amount_string_and_number() {
        assert_eq!(
            parse_amount(&serde_json::json!("29.70")),
            Decimal::new(2970, 2)
        );
        assert_eq!(parse_amount(&serde_json::json!(10)), Decimal::new(10, 0));
        assert_eq!(parse_amount(&serde_json::Value::Null), Decimal::ZERO);
    }
}
