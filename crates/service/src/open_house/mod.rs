//! Open-house application service: listing queries and lead intake.

pub mod filter;
pub mod service;

pub use filter::ListingFilter;
pub use service::{OpenHouseService, SheetRanges};
