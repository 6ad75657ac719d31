//! Merchant order reference.
//!
//! The reference is the only correlation key the payment processor echoes
//! back in callbacks, so it must be unique and must exist before the payment
//! transaction is created.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

const SUFFIX_LEN: usize = 4;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Merchant-assigned order correlation string, unique per order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    /// Generate a fresh reference: `ORD-<unix millis>-<random suffix>`.
    ///
    /// The millisecond timestamp alone would collide under concurrent
    /// checkouts; the random suffix disambiguates. The database still
    /// enforces uniqueness.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
                SUFFIX_ALPHABET[idx] as char
            })
            .collect();

        Self(format!("ORD-{}-{suffix}", Utc::now().timestamp_millis()))
    }

    /// Wrap an existing reference string (e.g. from a webhook payload).
    #[must_use]
    pub fn from_string(reference: String) -> Self {
        Self(reference)
    }

    /// The reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderReference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&str> for OrderReference {
    fn from(reference: &str) -> Self {
        Self(reference.to_owned())
    }
}
