//! Cart route handlers.
//!
//! The cart is stored in the server session and mutated through these
//! handlers. UI events are sequential per session, so handlers follow a
//! simple read-modify-write pattern against the session store.

use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models::session_keys;
use crate::models::{Cart, CartLine};

/// Cart response body.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines().to_vec(),
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
        }
    }
}

/// Read the cart from the session, defaulting to empty.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: String,
    pub quantity: u32,
}

/// Remove line request body.
#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
}

/// Show the current cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a line to the cart.
#[instrument(skip(session, line))]
pub async fn add(session: Session, Json(line): Json<CartLine>) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.add(line);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Set the quantity of a line; zero removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(&request.id, request.quantity);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(request): Json<RemoveRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(&request.id);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
