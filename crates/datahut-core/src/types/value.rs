//! Tagged values carried by records
//!
//! A [`Value`] is one of the scalar categories a column can hold, `Null`, or a
//! composite JSON document. JSON documents may live in a record while a
//! callback works on it, but they never become columns.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::{FromSqlError, ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a value, and of the column that stores it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Integer,
    Float,
    Boolean,
    Text,
    DateTime,
    Blob,
    /// Composite document, never column-eligible
    Json,
}

impl ValueType {
    /// Every category that can back a column.
    pub const SCALARS: [ValueType; 6] = [
        ValueType::Integer,
        ValueType::Float,
        ValueType::Boolean,
        ValueType::Text,
        ValueType::DateTime,
        ValueType::Blob,
    ];

    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueType::Json)
    }

    /// Declared SQLite column type.
    ///
    /// The declared type is persisted in the table definition, which is how a
    /// reopened store recovers each column's category.
    pub fn sql_type(self) -> &'static str {
        match self {
            ValueType::Integer => "INTEGER",
            ValueType::Float => "REAL",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Text => "TEXT",
            ValueType::DateTime => "TIMESTAMP",
            ValueType::Blob => "BLOB",
            ValueType::Json => "JSON",
        }
    }

    /// Inverse of [`ValueType::sql_type`], tolerant of common aliases.
    pub fn from_sql_type(declared: &str) -> Option<Self> {
        match declared.trim().to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" | "BIGINT" => Some(ValueType::Integer),
            "REAL" | "FLOAT" | "DOUBLE" => Some(ValueType::Float),
            "BOOLEAN" | "BOOL" => Some(ValueType::Boolean),
            "TEXT" | "VARCHAR" | "STRING" => Some(ValueType::Text),
            "TIMESTAMP" | "DATETIME" => Some(ValueType::DateTime),
            "BLOB" => Some(ValueType::Blob),
            _ => None,
        }
    }

    /// Whether a column of this type stores a value of `value` type as-is.
    ///
    /// Integers widen into float columns; every other pairing must match.
    pub fn accepts(self, value: ValueType) -> bool {
        self == value || (self == ValueType::Float && value == ValueType::Integer)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Text => "text",
            ValueType::DateTime => "datetime",
            ValueType::Blob => "blob",
            ValueType::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    DateTime(DateTime<Utc>),
    Blob(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    /// Category of this value, `None` for `Null`.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Float(_) => Some(ValueType::Float),
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Text(_) => Some(ValueType::Text),
            Value::DateTime(_) => Some(ValueType::DateTime),
            Value::Blob(_) => Some(ValueType::Blob),
            Value::Json(_) => Some(ValueType::Json),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view of a numeric value; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }

    /// Decode a stored cell according to the category of its column.
    pub fn from_column(raw: ValueRef<'_>, column_type: ValueType) -> Result<Value, FromSqlError> {
        let value = match (raw, column_type) {
            (ValueRef::Null, _) => Value::Null,
            (ValueRef::Integer(v), ValueType::Boolean) => Value::Boolean(v != 0),
            (ValueRef::Integer(v), ValueType::Float) => Value::Float(v as f64),
            (ValueRef::Integer(v), _) => Value::Integer(v),
            (ValueRef::Real(v), _) => Value::Float(v),
            (ValueRef::Text(bytes), ValueType::DateTime) => {
                let text = std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                let parsed = DateTime::parse_from_rfc3339(text)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))?;
                Value::DateTime(parsed.with_timezone(&Utc))
            }
            (ValueRef::Text(bytes), _) => Value::Text(
                std::str::from_utf8(bytes)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))?
                    .to_string(),
            ),
            (ValueRef::Blob(bytes), _) => Value::Blob(bytes.to_vec()),
        };
        Ok(value)
    }

    /// Map a JSON value onto the closest scalar; arrays and objects stay
    /// composite.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            composite => Value::Json(composite),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(v) => serde_json::Value::Bool(*v),
            Value::Text(v) => serde_json::Value::String(v.clone()),
            Value::DateTime(v) => serde_json::Value::String(format_datetime(v)),
            Value::Blob(v) => serde_json::Value::from(v.clone()),
            Value::Json(v) => v.clone(),
        }
    }
}

/// Canonical text form of a timestamp.
///
/// Equality lookups compare stored text, so every timestamp must render the
/// same way on every write.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Boolean(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::DateTime(v) => ToSqlOutput::Owned(SqlValue::Text(format_datetime(v))),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            Value::Json(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure(
                    "json documents cannot be bound to a column".into(),
                ))
            }
        };
        Ok(output)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::DateTime(v) => f.write_str(&format_datetime(v)),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

/// Dates are stored as midnight UTC.
impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::DateTime(v.and_time(NaiveTime::MIN).and_utc())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from_json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
