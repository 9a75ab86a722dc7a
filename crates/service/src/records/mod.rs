//! Typed records and the total mapping between them and raw sheet rows.
//!
//! Nothing here performs I/O. Listing parsing never fails: malformed cells
//! default, unusable rows are dropped.

pub mod email;
pub mod lead;
pub mod listing;

pub use lead::{Lead, LeadInput, LEAD_COLUMNS};
pub use listing::{listing_from_row, listings_from_table, Listing};
