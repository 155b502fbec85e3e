pub mod record;
pub mod schema;
pub mod value;

pub use record::{Record, RecordId, StoredRecord};
pub use schema::{
    is_reserved, TableSchema, ID_COLUMN, META_TABLE, PROCESSED_COLUMN, RECORD_TABLE,
};
pub use value::{format_datetime, Value, ValueType};
