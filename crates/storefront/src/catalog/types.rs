//! Catalog row types and normalization.
//!
//! The catalog tables are hand-maintained and loosely typed: prices arrive
//! as numbers or formatted strings, images are sometimes missing, and the
//! subscription table uses Lithuanian column names. Raw rows are normalized
//! into fixed shapes here, at the boundary, so the rest of the service never
//! sees the inconsistencies.

use serde::{Deserialize, Serialize};

use elida_core::{Price, ProductId, SubscriptionId};

/// Fallback image for rows without one.
pub const DEFAULT_PRODUCT_IMAGE: &str = "/elida-logo.svg";

/// Raw product row as stored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored as number or formatted string, sometimes null.
    #[serde(default)]
    pub price: serde_json::Value,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub imageurl: Option<String>,
    #[serde(default)]
    pub variants: Option<Vec<String>>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
}

/// A normalized catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Price,
    pub sku: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        Self {
            id: ProductId::new(raw.id),
            name: raw.name.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            price: Price::parse_lenient(&raw.price),
            sku: raw.sku.unwrap_or_default(),
            image_url: raw
                .imageurl
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_owned()),
            variants: raw.variants.filter(|v| !v.is_empty()),
            features: raw.features.filter(|f| !f.is_empty()),
        }
    }
}

/// Raw subscription tier row. The table predates this service and uses
/// Lithuanian column names ("Min kiekis" = minute quantity, "Kaina" = price).
#[derive(Debug, Clone, Deserialize)]
pub struct RawSubscription {
    pub id: i64,
    #[serde(rename = "Min kiekis", default)]
    pub minute_quantity: Option<String>,
    #[serde(rename = "Kaina", default)]
    pub price: serde_json::Value,
    #[serde(default)]
    pub imageurl: Option<String>,
}

/// A normalized subscription tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionTier {
    pub id: SubscriptionId,
    /// Human-readable minute-quantity label, e.g. "100 min".
    pub minutes: String,
    pub price: Price,
    pub image_url: String,
}

impl From<RawSubscription> for SubscriptionTier {
    fn from(raw: RawSubscription) -> Self {
        Self {
            id: SubscriptionId::new(raw.id),
            minutes: raw.minute_quantity.unwrap_or_default(),
            price: Price::parse_lenient(&raw.price),
            image_url: raw
                .imageurl
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_owned()),
        }
    }
}
