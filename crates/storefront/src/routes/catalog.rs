//! Catalog route handlers.
//!
//! Pure reads against the catalog store. Product routes propagate fetch
//! failures (the page shows an error); the subscriptions route answers an
//! empty list instead, so the subscription grid renders without tiers rather
//! than breaking the page.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{instrument, warn};

use elida_core::ProductId;

use crate::catalog::{Product, SubscriptionTier};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// List all products.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().products().await?;
    Ok(Json(products.as_ref().clone()))
}

/// Fetch a single product by id.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>> {
    let product = state
        .catalog()
        .product(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(product))
}

/// List products in one category.
#[instrument(skip(state))]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().products_by_category(&category).await?;
    Ok(Json(products))
}

/// List subscription tiers in insertion order.
///
/// A catalog failure here degrades to an empty list: the caller renders no
/// tiers instead of an error page.
#[instrument(skip(state))]
pub async fn subscriptions(State(state): State<AppState>) -> Json<Vec<SubscriptionTier>> {
    match state.catalog().subscriptions().await {
        Ok(tiers) => Json(tiers.as_ref().clone()),
        Err(e) => {
            warn!(error = %e, "subscription fetch failed, answering empty list");
            Json(Vec::new())
        }
    }
}
