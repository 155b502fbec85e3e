use crate::schema::check_value;
use crate::sql::quote_ident;
use crate::store::SqliteStore;
use datahut_core::{
    error::{HutError, Result, SchemaError},
    observe,
    types::{Record, RecordId, StoredRecord, TableSchema, Value, ValueType, ID_COLUMN, PROCESSED_COLUMN, RECORD_TABLE},
    RecordStore,
};
use rusqlite::{params_from_iter, types::Type, OptionalExtension, Row};

/// Column layout of a SELECT over the main table
///
/// The select list is built from the schema snapshot so each cell can be
/// decoded with the category of its column.
pub(crate) struct RowShape {
    columns: Vec<(String, ValueType)>,
}

impl RowShape {
    pub(crate) fn of(schema: &TableSchema) -> Self {
        Self {
            columns: schema
                .iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect(),
        }
    }

    /// `dw_id, dw_processed, "col", ...`
    pub(crate) fn select_list(&self) -> String {
        let mut list = format!("{}, {}", ID_COLUMN, PROCESSED_COLUMN);
        for (name, _) in &self.columns {
            list.push_str(", ");
            list.push_str(&quote_ident(name));
        }
        list
    }

    pub(crate) fn read(&self, row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
        let id: RecordId = row.get(0)?;
        let processed: bool = row.get(1)?;

        let mut fields = Record::new();
        for (offset, (name, column_type)) in self.columns.iter().enumerate() {
            let idx = offset + 2;
            let value = Value::from_column(row.get_ref(idx)?, *column_type).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })?;
            if !value.is_null() {
                fields.set(name.as_str(), value);
            }
        }

        Ok(StoredRecord {
            id,
            processed,
            fields,
        })
    }
}

/// `"col" = ?` or `"col" IS NULL`, pushing the bound value when needed.
pub(crate) fn equality_clause<'v>(
    sql: &mut String,
    params: &mut Vec<&'v Value>,
    column: &str,
    value: &'v Value,
) {
    if value.is_null() {
        sql.push_str(&format!(" AND {} IS NULL", quote_ident(column)));
    } else {
        sql.push_str(&format!(" AND {} = ?", quote_ident(column)));
        params.push(value);
    }
}

impl SqliteStore {
    fn row_exists(&self, sql: &str, params: &[&Value]) -> Result<bool> {
        let mut stmt = self.prepare(sql)?;
        let found: bool = stmt.query_row(params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(found)
    }

    /// Fields of `fields` ready to be written: every non-null value must
    /// already have a compatible column.
    fn bound_fields<'r>(&self, fields: &'r Record) -> Result<Vec<(&'r str, &'r Value)>> {
        let schema = self.schema_ref();
        let mut bound = Vec::with_capacity(fields.len());
        for (name, value) in fields.iter() {
            if check_value(self.registry(), &schema, name, value)?.is_some() {
                return Err(SchemaError::UnknownColumn(name.to_string()).into());
            }
            if value.is_null() && !schema.contains(name) {
                continue;
            }
            bound.push((name, value));
        }
        Ok(bound)
    }
}

impl RecordStore for SqliteStore {
    fn schema(&self) -> TableSchema {
        self.schema_ref().clone()
    }

    fn adapt_schema(&self, fields: &Record) -> Result<usize> {
        self.adapt(fields)
    }

    fn insert_if_absent(&self, fields: &Record) -> Result<bool> {
        let fields = fields.clone().without_nulls();
        let bound = self.bound_fields(&fields)?;

        // A row holding every given field is a duplicate, whatever else it carries
        let mut sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE 1=1", RECORD_TABLE);
        let mut params: Vec<&Value> = Vec::new();
        for &(column, value) in &bound {
            equality_clause(&mut sql, &mut params, column, value);
        }
        sql.push(')');

        if self.row_exists(&sql, &params)? {
            tracing::debug!("Skipping duplicate of an existing record");
            observe::record_insert(false);
            return Ok(false);
        }

        if bound.is_empty() {
            self.execute(&format!("INSERT INTO {} DEFAULT VALUES", RECORD_TABLE), [])?;
        } else {
            let columns: Vec<String> = bound.iter().map(|(name, _)| quote_ident(name)).collect();
            let placeholders = vec!["?"; bound.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                RECORD_TABLE,
                columns.join(", "),
                placeholders
            );
            self.execute(&sql, params_from_iter(bound.iter().map(|(_, v)| *v)))?;
        }

        observe::record_insert(true);
        Ok(true)
    }

    fn exists_match(&self, partial: &Record) -> Result<bool> {
        let mut sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE 1=1", RECORD_TABLE);
        let mut params: Vec<&Value> = Vec::new();
        {
            let schema = self.schema_ref();
            for (name, value) in partial.iter() {
                let Some(column_type) = schema.column_type(name) else {
                    return Ok(false);
                };
                if let Some(value_type) = self.registry().check(name, value)? {
                    if !column_type.accepts(value_type) {
                        return Ok(false);
                    }
                }
                equality_clause(&mut sql, &mut params, name, value);
            }
        }
        sql.push(')');
        self.row_exists(&sql, &params)
    }

    fn record_ids(&self, include_processed: bool) -> Result<Vec<RecordId>> {
        let mut sql = format!("SELECT {} FROM {}", ID_COLUMN, RECORD_TABLE);
        if !include_processed {
            sql.push_str(&format!(" WHERE {} = 0", PROCESSED_COLUMN));
        }
        sql.push_str(&format!(" ORDER BY {}", ID_COLUMN));

        let mut stmt = self.prepare(&sql)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<RecordId>, _>>()?;
        Ok(ids)
    }

    fn fetch_record(&self, id: RecordId) -> Result<Option<StoredRecord>> {
        let shape = RowShape::of(&self.schema_ref());
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            shape.select_list(),
            RECORD_TABLE,
            ID_COLUMN
        );
        let mut stmt = self.prepare(&sql)?;
        let record = stmt.query_row([id], |row| shape.read(row)).optional()?;
        Ok(record)
    }

    fn update_record(&self, id: RecordId, fields: &Record) -> Result<()> {
        let bound = self.bound_fields(fields)?;

        let changed = if bound.is_empty() {
            let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", RECORD_TABLE, ID_COLUMN);
            let mut stmt = self.prepare(&sql)?;
            let count: i64 = stmt.query_row([id], |row| row.get(0))?;
            count as usize
        } else {
            let assignments: Vec<String> = bound
                .iter()
                .map(|(name, _)| format!("{} = ?", quote_ident(name)))
                .collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ?",
                RECORD_TABLE,
                assignments.join(", "),
                ID_COLUMN
            );
            let id_value = Value::Integer(id);
            let params = bound.iter().map(|(_, v)| *v).chain(std::iter::once(&id_value));
            self.execute(&sql, params_from_iter(params))?
        };

        if changed == 0 {
            return Err(HutError::NotFound(format!("record {}", id)));
        }
        Ok(())
    }

    fn mark_all_processed(&self) -> Result<usize> {
        let rows = self.execute(
            &format!("UPDATE {} SET {} = 1", RECORD_TABLE, PROCESSED_COLUMN),
            [],
        )?;
        tracing::debug!("Marked {} records processed", rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datahut_core::HutConfig;

    fn open_store(dir: &tempfile::TempDir) -> SqliteStore {
        SqliteStore::open(HutConfig::new(dir.path().join("records.db"))).unwrap()
    }

    fn store_record(store: &SqliteStore, record: &Record) -> bool {
        store.adapt_schema(record).unwrap();
        store.insert_if_absent(record).unwrap()
    }

    #[test]
    fn test_insert_if_absent_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let barney = Record::new().with("name", "barney").with("age", 27);

        assert!(store_record(&store, &barney));
        assert!(!store_record(&store, &barney));
        assert_eq!(store.record_ids(true).unwrap().len(), 1);
    }

    #[test]
    fn test_extra_fields_break_the_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert!(store_record(&store, &Record::new().with("name", "barney")));
        // A row holding only part of the candidate is no match
        assert!(store_record(
            &store,
            &Record::new().with("name", "barney").with("age", 27)
        ));
        // Derived columns on a stored row do not hide it
        assert!(!store_record(&store, &Record::new().with("name", "barney")));
        // Null fields are dropped, so this matches the row above
        assert!(!store_record(
            &store,
            &Record::new().with("name", "barney").with("age", Value::Null)
        ));
        assert_eq!(store.record_ids(true).unwrap().len(), 2);
    }

    #[test]
    fn test_insert_requires_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let err = store
            .insert_if_absent(&Record::new().with("name", "lisa"))
            .unwrap_err();
        assert!(matches!(err, HutError::Schema(SchemaError::UnknownColumn(_))));
    }

    #[test]
    fn test_exists_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store_record(
            &store,
            &Record::new().with("name", "phil").with("age", 31),
        );

        assert!(store.exists_match(&Record::new().with("name", "phil")).unwrap());
        assert!(!store.exists_match(&Record::new().with("name", "jane")).unwrap());
        assert!(!store.exists_match(&Record::new().with("height", 180)).unwrap());
        assert!(!store.exists_match(&Record::new().with("age", "31")).unwrap());
        assert!(store
            .exists_match(&Record::new().with("name", "phil").with("age", 31))
            .unwrap());
    }

    #[test]
    fn test_fetch_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store_record(
            &store,
            &Record::new().with("name", "mary").with("age", 20),
        );
        let id = store.record_ids(true).unwrap()[0];

        let delta = Record::new().with("eligible", true);
        store.adapt_schema(&delta).unwrap();
        store.update_record(id, &delta).unwrap();

        let row = store.fetch_record(id).unwrap().unwrap();
        assert_eq!(row.fields.text("name").unwrap(), "mary");
        assert_eq!(row.fields.int("age").unwrap(), 20);
        assert!(row.fields.boolean("eligible").unwrap());
        assert!(!row.processed);

        store
            .update_record(id, &Record::new().with("age", Value::Null))
            .unwrap();
        let row = store.fetch_record(id).unwrap().unwrap();
        assert!(!row.fields.contains("age"));

        assert!(store.fetch_record(id + 100).unwrap().is_none());
        assert!(matches!(
            store.update_record(id + 100, &Record::new().with("age", 1)),
            Err(HutError::NotFound(_))
        ));
    }

    #[test]
    fn test_datetime_and_blob_roundtrip() {
        use chrono::TimeZone;

        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let seen = chrono::Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let record = Record::new()
            .with("seen", seen)
            .with("raw", vec![1u8, 2, 3]);
        store_record(&store, &record);
        assert!(!store.insert_if_absent(&record).unwrap());

        let id = store.record_ids(true).unwrap()[0];
        let row = store.fetch_record(id).unwrap().unwrap();
        assert_eq!(row.fields.datetime("seen").unwrap(), seen);
        assert_eq!(row.get("raw").and_then(Value::as_bytes), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_mark_all_processed_gates_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        for name in ["fred", "jane"] {
            store_record(&store, &Record::new().with("name", name));
        }

        assert_eq!(store.mark_all_processed().unwrap(), 2);
        assert_eq!(store.mark_all_processed().unwrap(), 2);
        assert!(store.record_ids(false).unwrap().is_empty());

        let names: Vec<String> = store
            .records(true)
            .unwrap()
            .map(|r| r.unwrap().fields.text("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["fred", "jane"]);
    }

    #[test]
    fn test_for_each_record_sees_rows_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        for age in [44, 27, 31] {
            store_record(&store, &Record::new().with("age", age));
        }

        let mut ages = Vec::new();
        let visited = store
            .for_each_record(false, |row| {
                ages.push(row.fields.int("age")?);
                Ok(())
            })
            .unwrap();
        assert_eq!(visited, 3);
        assert_eq!(ages, vec![44, 27, 31]);
    }
}
