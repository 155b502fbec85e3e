use crate::types::ValueType;
use std::io;
use thiserror::Error;

/// Schema evolution failures.
///
/// Raised before any DDL runs, so a rejected record never leaves a partially
/// evolved table behind.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("field '{field}' holds a value of unsupported type {type_name}")]
    UnsupportedType { field: String, type_name: String },

    #[error("field '{field}' holds a {value_type} value but its column is {column_type}")]
    TypeConflict {
        field: String,
        column_type: ValueType,
        value_type: ValueType,
    },

    #[error("no column named '{0}'")]
    UnknownColumn(String),

    /// Column names compare case-insensitively in SQLite, so `Name` cannot
    /// live next to `name`.
    #[error("field '{field}' differs only in case from column '{existing}'")]
    NameClash { field: String, existing: String },

    #[error("field '{field}' holds a non-finite float, which a column cannot store")]
    NonFiniteFloat { field: String },
}

#[derive(Error, Debug)]
pub enum HutError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Unable to serialize metadata for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unable to deserialize metadata for key '{key}': {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Field error: {0}")]
    Field(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Escape hatch for callbacks aborting a pass with their own error.
    ///
    /// ```ignore
    /// hut.extract(lines, |r, line| {
    ///     let parsed: Row = serde_json::from_str(&line?).map_err(anyhow::Error::from)?;
    ///     r.set("name", parsed.name);
    ///     Ok(())
    /// })?;
    /// ```
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl HutError {
    /// True when the error came from schema validation rather than I/O.
    pub fn is_schema(&self) -> bool {
        matches!(self, HutError::Schema(_))
    }
}

pub type Result<T> = std::result::Result<T, HutError>;

