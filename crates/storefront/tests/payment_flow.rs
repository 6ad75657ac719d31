//! HTTP-level tests for the payment and automation clients, against a mock
//! processor.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use elida_core::{Email, OrderReference, OrderStatus, ProcessorStatus, ShippingMethod};
use elida_storefront::config::MakeCommerceConfig;
use elida_storefront::models::order::{Order, OrderItem, OrderPayment, ShippingDetails};
use elida_storefront::services::automation::AutomationClient;
use elida_storefront::services::makecommerce::{MakeCommerceClient, PaymentError};

fn pickup_order() -> Order {
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

fn payment_client(server: &MockServer) -> MakeCommerceClient {
    let config = MakeCommerceConfig {
        api_url: server.uri(),
        store_id: "store-1".to_owned(),
        secret_key: SecretString::from("secret-key"),
    };
    MakeCommerceClient::new(&config, "https://elida.lt").unwrap()
}

#[tokio::test]
async fn create_transaction_two_calls_returns_redirect_url() {
    let server = MockServer::start().await;

    // First call: transaction created, no payment methods yet.
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(header_exists("authorization"))
        .and(body_partial_json(serde_json::json!({
            "transaction": { "amount": "29.70", "currency": "EUR", "reference": "ORD-42" },
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "tx-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Second call: callback URLs attached, redirect method now present.
    Mock::given(method("POST"))
        .and(path("/transactions/tx-1"))
        .and(body_partial_json(serde_json::json!({
            "transaction": {
                "transaction_url": {
                    "notification_url": {
                        "url": "https://elida.lt/api/payment-webhook?reference=ORD-42&transaction=tx-1",
                    },
                },
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "tx-1",
            "payment_methods": {
                "other": [{ "name": "redirect", "url": "https://pay.example/tx-1" }],
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = payment_client(&server)
        .create_transaction(&pickup_order(), None)
        .await
        .unwrap();

    assert_eq!(created.transaction_id, "tx-1");
    assert_eq!(created.redirect_url, "https://pay.example/tx-1");
}

#[tokio::test]
async fn create_transaction_without_redirect_method_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "tx-2" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/transactions/tx-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "tx-2",
            "payment_methods": { "other": [{ "name": "banklink", "url": "https://bank.example" }] },
        })))
        .mount(&server)
        .await;

    let result = payment_client(&server)
        .create_transaction(&pickup_order(), None)
        .await;

    assert!(matches!(result, Err(PaymentError::MissingRedirectUrl)));
}

#[tokio::test]
async fn create_transaction_surfaces_processor_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"message":"invalid amount"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = payment_client(&server)
        .create_transaction(&pickup_order(), None)
        .await;

    match result {
        Err(PaymentError::RequestFailed { status, body }) => {
            assert_eq!(status, 422);
            assert!(body.contains("invalid amount"));
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_payment_true_only_for_completed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions/tx-done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "tx-done",
            "status": "completed",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions/tx-open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "tx-open",
            "status": "pending",
        })))
        .mount(&server)
        .await;

    let client = payment_client(&server);
    assert!(client.verify_payment("tx-done").await);
    assert!(!client.verify_payment("tx-open").await);
}

#[tokio::test]
async fn verify_payment_false_when_processor_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions/tx-err"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = payment_client(&server);
    assert!(!client.verify_payment("tx-err").await);
    assert!(client.fetch_transaction("tx-err").await.is_none());
}

#[tokio::test]
async fn order_confirmation_is_delivered_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook/secret-segment"))
        .and(body_partial_json(serde_json::json!({
            "type": "ORDER_CONFIRMATION",
            "reference": "ORD-42",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        AutomationClient::new(SecretString::from(format!("{}/hook/secret-segment", server.uri())))
            .unwrap();

    let mut order = pickup_order();
    order.status = OrderStatus::Completed;
    order.payment = Some(OrderPayment {
        transaction_id: "tx-1".to_owned(),
        amount: Decimal::new(2970, 2),
        currency: "EUR".to_owned(),
        status: ProcessorStatus::Completed,
        processed_at: Utc::now(),
    });

    client.send_order_confirmation(&order).await.unwrap();
}

#[tokio::test]
async fn automation_failure_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(410).set_body_string("gone"))
        .mount(&server)
        .await;

    let client = AutomationClient::new(SecretString::from(server.uri())).unwrap();
    let err = client.send_new_order(&pickup_order()).await.unwrap_err();

    assert!(err.to_string().contains("410"));
}
