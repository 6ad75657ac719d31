//! HTTP route handlers for the storefront backend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (database)
//!
//! # Catalog (read-only)
//! GET  /api/products                 - All products
//! GET  /api/products/{id}            - Single product
//! GET  /api/products/category/{name} - Products in one category
//! GET  /api/subscriptions            - Subscription tiers (insertion order)
//!
//! # Cart (session-resident)
//! GET  /api/cart                     - Current cart
//! POST /api/cart/add                 - Add line (same id aggregates quantity)
//! POST /api/cart/update              - Set quantity (0 removes)
//! POST /api/cart/remove              - Remove line
//! POST /api/cart/clear               - Empty the cart
//!
//! # Checkout
//! POST /api/checkout                 - Create order + payment transaction,
//!                                      answers {reference, redirect_url}
//!
//! # Payment callbacks
//! POST /api/payment-webhook          - Server-pushed processor notification
//! GET  /payment/return               - Customer returning from payment page
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/products/category/{category}", get(catalog::products_by_category))
        .route("/subscriptions", get(catalog::subscriptions))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api", catalog_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/payment-webhook", post(webhook::payment_webhook))
        .route("/payment/return", get(webhook::payment_return))
}
