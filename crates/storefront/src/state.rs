//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::catalog::{CatalogClient, CatalogError};
use crate::config::StorefrontConfig;
use crate::services::automation::{AutomationClient, AutomationError};
use crate::services::makecommerce::{MakeCommerceClient, PaymentError};

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
    #[error("automation client: {0}")]
    Automation(#[from] AutomationError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogClient,
    payment: MakeCommerceClient,
    automation: AutomationClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the service clients fail to construct.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let catalog = CatalogClient::new(&config.catalog)?;
        let payment = MakeCommerceClient::new(&config.makecommerce, &config.base_url)?;
        let automation = AutomationClient::new(config.automation_webhook_url.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                payment,
                automation,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the catalog store client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the payment API client.
    #[must_use]
    pub fn payment(&self) -> &MakeCommerceClient {
        &self.inner.payment
    }

    /// Get a reference to the marketing-automation client.
    #[must_use]
    pub fn automation(&self) -> &AutomationClient {
        &self.inner.automation
    }
}
