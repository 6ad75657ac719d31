//! Catalog store client.
//!
//! Reads products and subscription tiers from the hosted table store's REST
//! interface (`PostgREST`). All reads are pure queries; the catalog is never
//! written from this service. Full listings are cached for five minutes.

pub mod types;

pub use types::{Product, SubscriptionTier};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::debug;

use elida_core::ProductId;

use crate::config::CatalogConfig;
use types::{RawProduct, RawSubscription};

/// Cache TTL for catalog listings.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Request timeout for catalog reads.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when reading the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client construction failed.
    #[error("client setup error: {0}")]
    Setup(String),
}

/// Cached catalog listings.
#[derive(Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Subscriptions(Arc<Vec<SubscriptionTier>>),
}

/// Client for the catalog store.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Setup` if the API key is not a valid header
    /// value or the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        let key = config.anon_key.expose_secret();
        let api_key = HeaderValue::from_str(key)
            .map_err(|e| CatalogError::Setup(format!("invalid API key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| CatalogError::Setup(format!("invalid API key: {e}")))?;
        headers.insert("apikey", api_key);
        headers.insert("Authorization", bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Setup(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: format!("{}/rest/v1", config.url),
                cache,
            }),
        })
    }

    /// Fetch all products, cached.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails or the store answers with
    /// a non-success status.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get("products:all").await {
            debug!("catalog cache hit: products");
            return Ok(products);
        }

        let raw: Vec<RawProduct> = self.get("products", &[("select", "*")]).await?;
        let products: Arc<Vec<Product>> = Arc::new(raw.into_iter().map(Product::from).collect());

        self.inner
            .cache
            .insert(
                "products:all".to_owned(),
                CacheValue::Products(Arc::clone(&products)),
            )
            .await;

        Ok(products)
    }

    /// Fetch products in one category. Not cached; category views are rare
    /// compared to the full listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    pub async fn products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        let filter = format!("eq.{category}");
        let raw: Vec<RawProduct> = self
            .get("products", &[("select", "*"), ("category", &filter)])
            .await?;

        Ok(raw.into_iter().map(Product::from).collect())
    }

    /// Fetch a single product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let filter = format!("eq.{id}");
        let raw: Vec<RawProduct> = self
            .get("products", &[("select", "*"), ("id", &filter)])
            .await?;

        Ok(raw.into_iter().next().map(Product::from))
    }

    /// Fetch all subscription tiers ordered by insertion id, cached.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    pub async fn subscriptions(&self) -> Result<Arc<Vec<SubscriptionTier>>, CatalogError> {
        if let Some(CacheValue::Subscriptions(tiers)) = self.inner.cache.get("subscriptions").await
        {
            debug!("catalog cache hit: subscriptions");
            return Ok(tiers);
        }

        let raw: Vec<RawSubscription> = self
            .get("abonomentai", &[("select", "*"), ("order", "id.asc")])
            .await?;
        let tiers: Arc<Vec<SubscriptionTier>> =
            Arc::new(raw.into_iter().map(SubscriptionTier::from).collect());

        self.inner
            .cache
            .insert(
                "subscriptions".to_owned(),
                CacheValue::Subscriptions(Arc::clone(&tiers)),
            )
            .await;

        Ok(tiers)
    }

    /// Execute a GET against one table and decode the JSON rows.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{table}", self.inner.base_url);
        let response = self.inner.client.get(&url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
