//! Query handle over the evolved main table

use crate::records::{equality_clause, RowShape};
use crate::sql::quote_ident;
use crate::store::SqliteStore;
use datahut_core::{
    error::{Result, SchemaError},
    types::{StoredRecord, Value, ValueType, ID_COLUMN, PROCESSED_COLUMN, RECORD_TABLE},
};
use rusqlite::params_from_iter;

/// Filter, order and aggregate stored rows.
///
/// Built with chained calls and consumed by a terminal operation. Equality
/// filters on a column the schema does not know match nothing; ordering or
/// aggregating by an unknown column is a [`SchemaError::UnknownColumn`].
///
/// ```ignore
/// let eligible = store
///     .dataset()
///     .filter("eligible", true)
///     .order_by("name")
///     .values("name")?;
/// ```
pub struct Dataset<'a> {
    store: &'a SqliteStore,
    filters: Vec<(String, Value)>,
    order: Option<(String, bool)>,
    limit: Option<u64>,
    only_unprocessed: bool,
}

/// WHERE clause and its bound values, or `None` when no row can match
type Selection<'q> = Option<(String, Vec<&'q Value>)>;

impl<'a> Dataset<'a> {
    pub(crate) fn new(store: &'a SqliteStore) -> Self {
        Self {
            store,
            filters: Vec::new(),
            order: None,
            limit: None,
            only_unprocessed: false,
        }
    }

    /// Keep rows whose `field` equals `value`; `Null` matches missing values.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order = Some((field.into(), false));
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order = Some((field.into(), true));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn only_unprocessed(mut self) -> Self {
        self.only_unprocessed = true;
        self
    }

    /// Matching rows, in the requested order or insertion order.
    pub fn all(&self) -> Result<Vec<StoredRecord>> {
        let shape = RowShape::of(&self.store.schema_ref());
        let Some((filter, params)) = self.selection() else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {} FROM {}{}",
            shape.select_list(),
            RECORD_TABLE,
            self.tail(&filter)?
        );

        let mut stmt = self.store.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| shape.read(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<u64> {
        match self.aggregate("COUNT(*)", None)? {
            Some(Value::Integer(n)) => Ok(n.max(0) as u64),
            _ => Ok(0),
        }
    }

    /// Mean of the non-null values of `field`, `None` when there are none.
    pub fn avg(&self, field: &str) -> Result<Option<f64>> {
        let avg = self.aggregate(&format!("AVG({})", quote_ident(field)), Some((field, ValueType::Float)))?;
        Ok(avg.and_then(|v| v.as_f64()))
    }

    /// Sum of `field`; integer columns sum to an integer.
    pub fn sum(&self, field: &str) -> Result<Option<Value>> {
        self.aggregate(&format!("SUM({})", quote_ident(field)), Some((field, ValueType::Integer)))
    }

    pub fn min(&self, field: &str) -> Result<Option<Value>> {
        let column_type = self.column_type(field)?;
        self.aggregate(&format!("MIN({})", quote_ident(field)), Some((field, column_type)))
    }

    pub fn max(&self, field: &str) -> Result<Option<Value>> {
        let column_type = self.column_type(field)?;
        self.aggregate(&format!("MAX({})", quote_ident(field)), Some((field, column_type)))
    }

    /// Row count per distinct value of `field`, ordered by value.
    pub fn group_count(&self, field: &str) -> Result<Vec<(Value, u64)>> {
        let column_type = self.column_type(field)?;
        let Some((filter, params)) = self.selection() else {
            return Ok(Vec::new());
        };
        let column = quote_ident(field);
        let sql = format!(
            "SELECT {col}, COUNT(*) FROM (SELECT * FROM {table}{tail}) GROUP BY {col} ORDER BY {col}",
            col = column,
            table = RECORD_TABLE,
            tail = self.tail(&filter)?
        );

        let mut stmt = self.store.prepare(&sql)?;
        let groups = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let value = decode(row, 0, column_type)?;
                let count: i64 = row.get(1)?;
                Ok((value, count.max(0) as u64))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// Values of one column across the matching rows, nulls included.
    pub fn values(&self, field: &str) -> Result<Vec<Value>> {
        let column_type = self.column_type(field)?;
        let Some((filter, params)) = self.selection() else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {} FROM {}{}",
            quote_ident(field),
            RECORD_TABLE,
            self.tail(&filter)?
        );

        let mut stmt = self.store.prepare(&sql)?;
        let values = stmt
            .query_map(params_from_iter(params.iter()), |row| decode(row, 0, column_type))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    fn column_type(&self, field: &str) -> Result<ValueType> {
        self.store
            .schema_ref()
            .column_type(field)
            .ok_or_else(|| SchemaError::UnknownColumn(field.to_string()).into())
    }

    fn selection(&self) -> Selection<'_> {
        let schema = self.store.schema_ref();
        let mut sql = String::from(" WHERE 1=1");
        let mut params = Vec::new();

        if self.only_unprocessed {
            sql.push_str(&format!(" AND {} = 0", PROCESSED_COLUMN));
        }
        for (field, value) in &self.filters {
            if !schema.contains(field) {
                return None;
            }
            equality_clause(&mut sql, &mut params, field, value);
        }
        Some((sql, params))
    }

    /// Filter followed by ORDER BY and LIMIT
    fn tail(&self, filter: &str) -> Result<String> {
        let mut sql = filter.to_string();
        match &self.order {
            Some((field, desc)) => {
                self.column_type(field)?;
                sql.push_str(&format!(
                    " ORDER BY {} {}, {}",
                    quote_ident(field),
                    if *desc { "DESC" } else { "ASC" },
                    ID_COLUMN
                ));
            }
            None => sql.push_str(&format!(" ORDER BY {}", ID_COLUMN)),
        }
        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        Ok(sql)
    }

    /// Single-value aggregate over the matching rows. `column` names the
    /// aggregated field, which must exist, and how to decode the result.
    fn aggregate(&self, expr: &str, column: Option<(&str, ValueType)>) -> Result<Option<Value>> {
        let result_type = match column {
            Some((field, result_type)) => {
                self.column_type(field)?;
                result_type
            }
            None => ValueType::Integer,
        };
        let Some((filter, params)) = self.selection() else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT {} FROM (SELECT * FROM {}{})",
            expr,
            RECORD_TABLE,
            self.tail(&filter)?
        );

        let mut stmt = self.store.prepare(&sql)?;
        let value = stmt.query_row(params_from_iter(params.iter()), |row| decode(row, 0, result_type))?;
        Ok(if value.is_null() { None } else { Some(value) })
    }
}

fn decode(row: &rusqlite::Row<'_>, idx: usize, column_type: ValueType) -> rusqlite::Result<Value> {
    Value::from_column(row.get_ref(idx)?, column_type).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use crate::store::SqliteStore;
    use datahut_core::{HutConfig, HutError, Record, RecordStore, SchemaError, Value};

    fn people(dir: &tempfile::TempDir) -> SqliteStore {
        let store = SqliteStore::open(HutConfig::new(dir.path().join("people.db"))).unwrap();
        for (name, age) in [
            ("fred", 44),
            ("barney", 27),
            ("phil", 31),
            ("jane", 16),
            ("lisa", 22),
            ("mary", 23),
        ] {
            let record = Record::new().with("name", name).with("age", age);
            store.adapt_schema(&record).unwrap();
            store.insert_if_absent(&record).unwrap();
        }
        store
    }

    #[test]
    fn test_count_and_avg() {
        let dir = tempfile::tempdir().unwrap();
        let store = people(&dir);

        assert_eq!(store.dataset().count().unwrap(), 6);
        let avg = store.dataset().avg("age").unwrap().unwrap();
        assert!((avg - 27.166666666666668).abs() < 1e-9);
        assert_eq!(store.dataset().sum("age").unwrap(), Some(Value::Integer(163)));
        assert_eq!(store.dataset().min("age").unwrap(), Some(Value::Integer(16)));
        assert_eq!(store.dataset().max("name").unwrap(), Some(Value::from("phil")));
    }

    #[test]
    fn test_filter_order_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = people(&dir);

        let names = store.dataset().order_by("name").limit(2).values("name").unwrap();
        assert_eq!(names, vec![Value::from("barney"), Value::from("fred")]);

        let oldest = store.dataset().order_by_desc("age").all().unwrap();
        assert_eq!(oldest[0].fields.text("name").unwrap(), "fred");

        let phil = store.dataset().filter("age", 31).all().unwrap();
        assert_eq!(phil.len(), 1);
        assert_eq!(phil[0].fields.text("name").unwrap(), "phil");
    }

    #[test]
    fn test_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = people(&dir);

        assert_eq!(store.dataset().filter("height", 180).count().unwrap(), 0);
        assert!(store.dataset().filter("height", 180).all().unwrap().is_empty());
        assert!(matches!(
            store.dataset().order_by("height").all(),
            Err(HutError::Schema(SchemaError::UnknownColumn(_)))
        ));
        assert!(store.dataset().avg("height").is_err());
    }

    #[test]
    fn test_group_count_and_unprocessed() {
        let dir = tempfile::tempdir().unwrap();
        let store = people(&dir);
        store.mark_all_processed().unwrap();

        let record = Record::new().with("name", "barney").with("age", 28);
        store.insert_if_absent(&record).unwrap();

        let groups = store.dataset().group_count("name").unwrap();
        assert_eq!(groups[0], (Value::from("barney"), 2));
        assert_eq!(groups.len(), 6);

        assert_eq!(store.dataset().only_unprocessed().count().unwrap(), 1);
        assert_eq!(
            store.dataset().filter("name", Value::Null).count().unwrap(),
            0
        );
    }
}
