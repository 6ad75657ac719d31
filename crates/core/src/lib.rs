//! ELIDA Core - Shared types library.
//!
//! This crate provides common types used by the ELIDA storefront service:
//! price normalization for the heterogeneous catalog data, status enums for
//! orders and payments, and newtype wrappers for IDs and order references.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
