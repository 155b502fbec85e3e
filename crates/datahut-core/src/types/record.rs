use crate::error::{HutError, Result};
use crate::types::value::Value;
use chrono::{DateTime, Utc};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Identity assigned by the store to every row
pub type RecordId = i64;

/// Field name to value mapping flowing through extract and transform
///
/// Field order is not significant; iteration is by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Drop every field whose value is `Null`.
    ///
    /// Absence and null are equivalent to the store, so this never changes
    /// what a record means.
    pub fn drop_nulls(&mut self) {
        self.fields.retain(|_, v| !v.is_null());
    }

    pub fn without_nulls(mut self) -> Self {
        self.drop_nulls();
        self
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.typed(name, "integer", Value::as_i64)
    }

    /// Numeric field as a float; integer fields widen.
    pub fn float(&self, name: &str) -> Result<f64> {
        self.typed(name, "float", Value::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        self.typed(name, "boolean", Value::as_bool)
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        self.typed(name, "text", Value::as_str)
    }

    pub fn datetime(&self, name: &str) -> Result<DateTime<Utc>> {
        self.typed(name, "datetime", Value::as_datetime)
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &str,
        view: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T> {
        let value = match self.fields.get(name) {
            None | Some(Value::Null) => {
                return Err(HutError::Field(format!("field '{}' is not set", name)))
            }
            Some(value) => value,
        };
        view(value).ok_or_else(|| {
            let actual = value
                .value_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "null".to_string());
            HutError::Field(format!(
                "field '{}' holds a {} value, expected {}",
                name, actual, expected
            ))
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// A row read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub processed: bool,
    /// Data fields only; null columns are omitted.
    pub fields: Record,
}

impl StoredRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
