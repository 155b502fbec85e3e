//! Schema evolution for the main table
//!
//! Every non-null field of a record needs a column. A missing column is added
//! with the field's category as its declared type, together with a secondary
//! index. Existing columns are never retyped: a value whose category the
//! column does not accept is rejected before any DDL runs.

use crate::sql::{index_name, quote_ident};
use crate::store::SqliteStore;
use datahut_core::{
    error::{HutError, Result, SchemaError},
    observe,
    types::{is_reserved, Record, TableSchema, Value, ValueType, RECORD_TABLE},
    TypeRegistry,
};

/// Reject names the store cannot use as data columns.
pub(crate) fn check_field_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(HutError::Usage("field names must not be empty".into()));
    }
    if is_reserved(name) {
        return Err(HutError::Usage(format!(
            "'{}' is a bookkeeping column and cannot be used as a field name",
            name
        )));
    }
    Ok(())
}

/// Check one value against the registry and, if it exists, its column.
///
/// Returns `Some(type)` when the field still needs a column.
pub(crate) fn check_value(
    registry: &TypeRegistry,
    schema: &TableSchema,
    field: &str,
    value: &Value,
) -> Result<Option<ValueType>> {
    check_field_name(field)?;
    let Some(value_type) = registry.check(field, value)? else {
        return Ok(None);
    };
    match schema.column_type(field) {
        Some(column_type) if column_type.accepts(value_type) => Ok(None),
        Some(column_type) => Err(SchemaError::TypeConflict {
            field: field.to_string(),
            column_type,
            value_type,
        }
        .into()),
        None => {
            // SQLite folds ASCII case when resolving column names
            if let Some(existing) = schema.names().find(|c| c.eq_ignore_ascii_case(field)) {
                return Err(name_clash(field, existing));
            }
            Ok(Some(value_type))
        }
    }
}

fn name_clash(field: &str, existing: &str) -> HutError {
    SchemaError::NameClash {
        field: field.to_string(),
        existing: existing.to_string(),
    }
    .into()
}

impl SqliteStore {
    /// Columns `fields` would add, after validating every field.
    fn plan_columns(&self, fields: &Record) -> Result<Vec<(String, ValueType)>> {
        let schema = self.schema_ref();
        let mut pending: Vec<(String, ValueType)> = Vec::new();
        for (name, value) in fields.iter() {
            if let Some(value_type) = check_value(self.registry(), &schema, name, value)? {
                if let Some((other, _)) = pending.iter().find(|(p, _)| p.eq_ignore_ascii_case(name)) {
                    return Err(name_clash(name, other));
                }
                pending.push((name.to_string(), value_type));
            }
        }
        Ok(pending)
    }

    pub(crate) fn adapt(&self, fields: &Record) -> Result<usize> {
        let pending = self.plan_columns(fields)?;
        if pending.is_empty() {
            return Ok(0);
        }

        let txn = self.begin_schema_txn()?;
        for (name, value_type) in &pending {
            txn.execute(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                RECORD_TABLE,
                quote_ident(name),
                value_type.sql_type()
            ))?;
            txn.execute(&format!(
                "CREATE INDEX {} ON {}({})",
                quote_ident(&index_name(RECORD_TABLE, name)),
                RECORD_TABLE,
                quote_ident(name)
            ))?;
        }
        txn.commit()?;

        let added = pending.len();
        let mut schema = self.schema.borrow_mut();
        for (name, value_type) in pending {
            tracing::debug!(column = %name, column_type = %value_type, "added column");
            schema.add_column(name, value_type);
        }
        observe::record_columns_added(added);
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datahut_core::{HutConfig, RecordStore};

    fn open_store(dir: &tempfile::TempDir) -> SqliteStore {
        SqliteStore::open(HutConfig::new(dir.path().join("schema.db"))).unwrap()
    }

    fn index_names(store: &SqliteStore) -> Vec<String> {
        store
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'data_warehouse'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_adds_column_and_index_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let added = store
            .adapt_schema(&Record::new().with("name", "barney").with("age", 27))
            .unwrap();
        assert_eq!(added, 2);

        let indexes = index_names(&store);
        assert!(indexes.contains(&"idx_data_warehouse_name".to_string()));
        assert!(indexes.contains(&"idx_data_warehouse_age".to_string()));

        // Already known: nothing to do
        assert_eq!(
            store
                .adapt_schema(&Record::new().with("name", "phil"))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_null_fields_do_not_create_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store
            .adapt_schema(&Record::new().with("name", "phil").with("login", Value::Null))
            .unwrap();
        assert!(!store.schema().contains("login"));
    }

    #[test]
    fn test_unsupported_type_leaves_schema_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let record = Record::new()
            .with("name", "fred")
            .with("my_foo", serde_json::json!({"kind": "foo"}));
        let err = store.adapt_schema(&record).unwrap_err();

        assert!(matches!(
            err,
            HutError::Schema(SchemaError::UnsupportedType { ref field, .. }) if field == "my_foo"
        ));
        // Validation runs before DDL, so the valid field was not added either
        assert!(store.schema().is_empty());
    }

    #[test]
    fn test_type_conflict_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store.adapt_schema(&Record::new().with("age", 27)).unwrap();

        let err = store
            .adapt_schema(&Record::new().with("age", "twenty-seven"))
            .unwrap_err();
        assert!(matches!(
            err,
            HutError::Schema(SchemaError::TypeConflict {
                column_type: ValueType::Integer,
                value_type: ValueType::Text,
                ..
            })
        ));
        assert_eq!(store.schema().column_type("age"), Some(ValueType::Integer));
    }

    #[test]
    fn test_integer_widens_into_float_column() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store.adapt_schema(&Record::new().with("temperature", 41.5)).unwrap();

        let record = Record::new().with("temperature", 40);
        assert_eq!(store.adapt_schema(&record).unwrap(), 0);
        assert!(store.insert_if_absent(&record).unwrap());

        let values = store.dataset().values("temperature").unwrap();
        assert_eq!(values, vec![Value::Float(40.0)]);
    }

    #[test]
    fn test_reserved_and_empty_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert!(matches!(
            store.adapt_schema(&Record::new().with("dw_id", 1)),
            Err(HutError::Usage(_))
        ));
        assert!(matches!(
            store.adapt_schema(&Record::new().with("", 1)),
            Err(HutError::Usage(_))
        ));
    }

    #[test]
    fn test_case_variants_of_a_name_clash() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        // Both new in the same record
        let err = store
            .adapt_schema(&Record::new().with("name", "a").with("Name", 1))
            .unwrap_err();
        assert!(matches!(err, HutError::Schema(SchemaError::NameClash { .. })));
        assert!(store.schema().is_empty());

        // Against a column that already exists
        store.adapt_schema(&Record::new().with("name", "a")).unwrap();
        let err = store
            .adapt_schema(&Record::new().with("NAME", "b"))
            .unwrap_err();
        assert!(matches!(
            err,
            HutError::Schema(SchemaError::NameClash { ref field, ref existing })
                if field == "NAME" && existing == "name"
        ));
        assert_eq!(store.schema().len(), 1);

        // Bookkeeping columns are reserved in any case
        assert!(matches!(
            store.adapt_schema(&Record::new().with("DW_Processed", true)),
            Err(HutError::Usage(_))
        ));
    }

    #[test]
    fn test_field_named_like_the_meta_key_gets_its_own_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let record = Record::new().with("meta_key", 1);
        assert_eq!(store.adapt_schema(&record).unwrap(), 1);
        assert!(index_names(&store).contains(&"idx_data_warehouse_meta_key".to_string()));
        assert!(store.insert_if_absent(&record).unwrap());
    }

    #[test]
    fn test_odd_field_names_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let record = Record::new()
            .with("wind speed (kts)", 12.0)
            .with("say \"when\"", "now");
        assert_eq!(store.adapt_schema(&record).unwrap(), 2);
        assert!(store.insert_if_absent(&record).unwrap());
        assert!(!store.insert_if_absent(&record).unwrap());
    }

    #[test]
    fn test_narrowed_registry_rejects_excluded_types() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = HutConfig::new(dir.path().join("narrow.db"))
            .with_allowed_types([ValueType::Text, ValueType::Integer]);
        let store = SqliteStore::open(cfg).unwrap();

        let err = store
            .adapt_schema(&Record::new().with("raw", vec![0u8, 1, 2]))
            .unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("blob"));
    }
}
