//! SQLite-backed record store for datahut
//!
//! One store file holds the evolving main table (`data_warehouse`) and the
//! metadata side table (`data_warehouse_meta`).
//!
//! Key features:
//! - Columns and indexes added on demand, each inside its own transaction
//! - Deduplicating inserts
//! - Query handle with equality filters, ordering and aggregates
//! - Every executed statement available to an attached log sink

mod meta;
pub mod query;
mod records;
mod schema;
pub mod sql;
pub mod store;
mod txn;

pub use query::Dataset;
pub use store::SqliteStore;
