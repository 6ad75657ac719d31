//! Validated email address.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error validating an email address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("email is empty")]
    Empty,
    #[error("email is missing '@': {0}")]
    MissingAt(String),
    #[error("email is too long ({0} chars, max 254)")]
    TooLong(usize),
}

/// A syntactically plausible email address.
///
/// Validation is intentionally shallow (non-empty, contains `@`, length
/// bounded). Deliverability is the mail provider's problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    const MAX_LEN: usize = 254;

    /// Parse and validate an email address. Trims surrounding whitespace
    /// and lowercases the result.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the input is empty, lacks an `@` with text on
    /// both sides, or exceeds 254 characters.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(EmailError::TooLong(trimmed.len()));
        }
        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() {
            return Err(EmailError::MissingAt(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// The email as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let email = Email::parse("Info@Elida.LT").expect("valid");
        assert_eq!(email.as_str(), "info@elida.lt");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let email = Email::parse("  user@example.com ").expect("valid");
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_rejects_missing_at() {
        assert!(Email::parse("no-at-sign").is_err());
        assert!(Email::parse("@domain.only").is_err());
        assert!(Email::parse("local.only@").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let email: Email = serde_json::from_str("\"a@b.lt\"").expect("deserialize");
        assert_eq!(email.as_str(), "a@b.lt");
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
