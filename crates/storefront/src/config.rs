//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ELIDA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ELIDA_BASE_URL` - Public URL of this site, used to build payment callback URLs
//! - `MAKECOMMERCE_STORE_ID` - MakeCommerce store identifier
//! - `MAKECOMMERCE_SECRET_KEY` - MakeCommerce API secret key
//! - `SUPABASE_URL` - Catalog store base URL
//! - `SUPABASE_ANON_KEY` - Catalog store read-only API key
//! - `AUTOMATION_WEBHOOK_URL` - Marketing-automation webhook URL (contains a secret path segment)
//!
//! ## Optional
//! - `ELIDA_HOST` - Bind address (default: 127.0.0.1)
//! - `ELIDA_PORT` - Listen port (default: 3000)
//! - `MAKECOMMERCE_API_URL` - Payment API base (default: <https://api.maksekeskus.ee/v1>)
//! - `SHIPPING_FLAT_FEE` - Flat shipping fee in EUR (default: 0)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! Credentials have no hardcoded fallbacks: a missing required variable fails
//! startup with [`ConfigError::MissingEnvVar`].

use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront (payment callbacks point here)
    pub base_url: String,
    /// MakeCommerce payment API configuration
    pub makecommerce: MakeCommerceConfig,
    /// Catalog store configuration
    pub catalog: CatalogConfig,
    /// Marketing-automation webhook URL (the URL itself is the secret)
    pub automation_webhook_url: SecretString,
    /// Flat shipping fee applied when the customer chooses home delivery
    pub shipping_flat_fee: Decimal,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// MakeCommerce payment API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct MakeCommerceConfig {
    /// API base URL, e.g. `https://api.maksekeskus.ee/v1`
    pub api_url: String,
    /// Store identifier (the Basic auth username)
    pub store_id: String,
    /// Secret key (the Basic auth password)
    pub secret_key: SecretString,
}

impl std::fmt::Debug for MakeCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MakeCommerceConfig")
            .field("api_url", &self.api_url)
            .field("store_id", &self.store_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Catalog store (Supabase `PostgREST`) configuration.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Anonymous read-only API key
    pub anon_key: SecretString,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ELIDA_DATABASE_URL")?;
        let host = get_env_or_default("ELIDA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ELIDA_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("ELIDA_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ELIDA_PORT".to_owned(), e.to_string()))?;
        let base_url = get_required_env("ELIDA_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ELIDA_BASE_URL".to_owned(), e.to_string())
        })?;
        let base_url = base_url.trim_end_matches('/').to_owned();
        let shipping_flat_fee = get_env_or_default("SHIPPING_FLAT_FEE", "0")
            .parse::<Decimal>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHIPPING_FLAT_FEE".to_owned(), e.to_string())
            })?;

        let makecommerce = MakeCommerceConfig::from_env()?;
        let catalog = CatalogConfig::from_env()?;
        let automation_webhook_url = get_required_secret("AUTOMATION_WEBHOOK_URL")?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            makecommerce,
            catalog,
            automation_webhook_url,
            shipping_flat_fee,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MakeCommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default("MAKECOMMERCE_API_URL", "https://api.maksekeskus.ee/v1")
                .trim_end_matches('/')
                .to_owned(),
            store_id: get_required_env("MAKECOMMERCE_STORE_ID")?,
            secret_key: get_required_secret("MAKECOMMERCE_SECRET_KEY")?,
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: get_required_env("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_owned(),
            anon_key: get_required_secret("SUPABASE_ANON_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
