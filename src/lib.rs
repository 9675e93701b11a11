//! # Price Load Generator Library
//!
//! Drives concurrent virtual users against the price-lookup GraphQL endpoint,
//! authenticating with a bearer token that a single background task keeps
//! fresh through the OAuth2 client-credentials flow.
//!
//! Modules:
//! - `cache`: the refreshed credential and its background renewal loop
//! - `auth`: token fetching (OAuth2 client credentials)
//! - `probe`: timed price requests and their classification
//! - `load`: virtual-user scheduling
//! - `config`: YAML configuration, defaults and validation

pub mod auth;
pub mod cache;
pub mod config;
pub mod data;
pub mod helpers;
pub mod load;
pub mod observability;
pub mod probe;
pub mod server;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::token_refresher::{RefreshSchedule, TokenRefresher};
pub use crate::config::service::ServiceConfig;
