//! Inventory domain module.
//!
//! This crate contains the catalog, the record shape and the previous-stock
//! rule, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod catalog;
pub mod record;
pub mod resolver;

pub use catalog::{Catalog, CatalogError, CatalogItem};
pub use record::{InventoryRecord, NewRecord, lenient_quantity};
pub use resolver::{PreviousStock, StockSource, latest_before, previous_stock, resolve};
