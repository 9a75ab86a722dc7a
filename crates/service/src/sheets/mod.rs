//! Google Sheets backend for [`crate::storage::TabularStore`].

pub mod auth;
pub mod client;

pub use auth::{AccessTokenSource, ServiceAccountKey, ServiceAccountTokens, StaticToken};
pub use client::SheetsStore;
