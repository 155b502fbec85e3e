//! DataHut Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use datahut::prelude::*;
//! ```

// Core types
pub use crate::{DataHut, HutError, Record, Result, SchemaError, StoredRecord, Value, ValueType};

// Configs
pub use crate::{HutConfig, SynchronousMode};

// Traits
pub use crate::{LogSink, MetadataStore, RecordStore};

// Pipelines and queries
pub use crate::{Dataset, ExtractStats, TransformStats};

// Re-export common external deps
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use tracing;
