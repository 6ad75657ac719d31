//! Core types for the ELIDA storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod reference;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use reference::OrderReference;
pub use status::*;
