//! Export functionality for the catalog and receipts.

mod csv;
mod receipt;

pub use csv::*;
pub use receipt::*;
