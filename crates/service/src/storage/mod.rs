//! Storage abstraction for the external tabular store.
//!
//! The service layer only ever reads a whole A1 range or appends one row,
//! so that is all the trait asks of an implementation.

use async_trait::async_trait;

use crate::errors::StoreError;

pub mod memory;

/// Row/column store addressed by A1-notation ranges (`tab!A:G`).
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// All cells of `range` as strings, first row being the headers.
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError>;

    /// Append `row` as a single new row after the last populated row of `range`.
    async fn append_row(&self, range: &str, row: Vec<String>) -> Result<(), StoreError>;

    /// Cheap reachability probe used at startup.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
