//! DataHut Core: types and traits for a schema-evolving record store
//!
//! This crate defines the pieces shared by every backend:
//! - Tagged values and the type registry deciding which may become columns
//! - Records, stored rows and the monotonically growing table schema
//! - Store traits for the main table and the metadata side table
//! - Error taxonomy, configuration and optional metrics
//!
//! Callers append heterogeneous records without declaring a schema; a store
//! adds a typed, indexed column for every field it has not seen before.

pub mod config;
pub mod error;
pub mod observe;
pub mod registry;
pub mod traits;
pub mod types;

pub use config::{HutConfig, SynchronousMode};
pub use error::{HutError, Result, SchemaError};
pub use registry::TypeRegistry;
pub use traits::{LogSink, MetadataStore, RecordStore, Records, TracingSink};
pub use types::{Record, RecordId, StoredRecord, TableSchema, Value, ValueType};
