//! ELIDA Storefront - backend service for the tanning-salon e-commerce site.
//!
//! # Architecture
//!
//! - Axum web framework serving a JSON API to the browser frontend
//! - Catalog reads from the hosted table store (`PostgREST`), cached 5 minutes
//! - Session-resident cart backed by `PostgreSQL` (tower-sessions)
//! - Orders persisted in `PostgreSQL`, merge-updated by payment callbacks
//! - MakeCommerce payment API for transactions and customer redirect
//! - Marketing-automation webhook for transactional email

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
