//! Dump command implementation

use anyhow::{Context, Result};
use datahut::prelude::*;
use datahut::{ID_COLUMN, PROCESSED_COLUMN};
use std::io::Write;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf, unprocessed: bool, order_by: Option<String>) -> Result<()> {
    let hut = DataHut::open(&db_path).context("Failed to open store")?;

    let mut dataset = hut.dataset();
    if unprocessed {
        dataset = dataset.only_unprocessed();
    }
    if let Some(field) = order_by {
        dataset = dataset.order_by(field);
    }
    let rows = dataset.all().context("Failed to read records")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in &rows {
        writeln!(out, "{}", to_json_line(row))?;
    }
    Ok(())
}

/// One stored record as a flat JSON object, bookkeeping columns first.
pub fn to_json_line(row: &StoredRecord) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    object.insert(ID_COLUMN.into(), row.id.into());
    object.insert(PROCESSED_COLUMN.into(), row.processed.into());
    for (name, value) in row.fields.iter() {
        object.insert(name.to_string(), value.to_json());
    }
    serde_json::Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_carries_bookkeeping_columns() {
        let row = StoredRecord {
            id: 7,
            processed: true,
            fields: Record::new().with("name", "phil").with("age", 31),
        };

        let line = to_json_line(&row);
        assert_eq!(line[ID_COLUMN], 7);
        assert_eq!(line[PROCESSED_COLUMN], true);
        assert_eq!(line["name"], "phil");
        assert_eq!(line["age"], 31);
    }
}
