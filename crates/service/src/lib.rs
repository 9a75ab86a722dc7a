//! Service layer for the open-house picks backend.
//! - `records`: typed listings and leads plus the row mapping in both directions.
//! - `storage`: the tabular store abstraction and an in-memory implementation.
//! - `sheets`: the Google Sheets implementation of that store.
//! - `open_house`: filtering, validation and the two application operations.

pub mod errors;
pub mod open_house;
pub mod records;
pub mod sheets;
pub mod storage;
