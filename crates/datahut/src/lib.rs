//! DataHut: a schema-evolving record store for exploratory ETL
//!
//! Records are appended without declaring a schema. Every field the store
//! has not seen before gets a typed, indexed column:
//! - **Extract**: map source elements to records, storing only novel ones
//! - **Transform**: add derived fields to stored records, incrementally
//! - **Dataset**: filter, order and aggregate what was stored
//! - **Metadata**: key to value side table for pipeline bookkeeping
//!
//! # Quick Start
//!
//! ```no_run
//! use datahut::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let hut = DataHut::connect("people")?;
//!
//! hut.extract([("fred", 44), ("jane", 16)], |r, (name, age)| {
//!     r.set("name", name).set("age", age);
//!     Ok(())
//! })?;
//!
//! hut.transform(false, |r| {
//!     let age = r.int("age")?;
//!     r.set("adult", age >= 18);
//!     Ok(())
//! })?;
//! hut.transform_complete()?;
//!
//! let adults = hut.dataset().filter("adult", true).count()?;
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod hut;
pub mod prelude;
pub mod transform;

// Re-export core types
pub use datahut_core::{
    config::{HutConfig, SynchronousMode},
    error::{HutError, Result, SchemaError},
    traits::{LogSink, MetadataStore, RecordStore, Records, TracingSink},
    types::{
        Record, RecordId, StoredRecord, TableSchema, Value, ValueType, ID_COLUMN, PROCESSED_COLUMN,
    },
    TypeRegistry,
};

// Re-export implementations
pub use datahut_sqlite::{Dataset, SqliteStore};

// Re-export main types from this crate
pub use extract::ExtractStats;
pub use hut::DataHut;
pub use transform::TransformStats;
