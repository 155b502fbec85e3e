use crate::types::value::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main table name
pub const RECORD_TABLE: &str = "data_warehouse";

/// Metadata side table name
pub const META_TABLE: &str = "data_warehouse_meta";

/// Identity column of the main table
pub const ID_COLUMN: &str = "dw_id";

/// Processed flag column of the main table
pub const PROCESSED_COLUMN: &str = "dw_processed";

/// True for the bookkeeping column names no field may use, in any case.
pub fn is_reserved(name: &str) -> bool {
    name.eq_ignore_ascii_case(ID_COLUMN) || name.eq_ignore_ascii_case(PROCESSED_COLUMN)
}

/// Snapshot of the data columns of the main table
///
/// Columns are only ever added. An existing column keeps the type it was
/// created with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: BTreeMap<String, ValueType>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_type(&self, name: &str) -> Option<ValueType> {
        self.columns.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Record a new column. Returns false and leaves the existing type alone
    /// if the column is already known.
    pub fn add_column(&mut self, name: impl Into<String>, column_type: ValueType) -> bool {
        match self.columns.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(column_type);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueType)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}
