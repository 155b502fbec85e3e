//! Allow-list of value categories eligible to become columns

use crate::error::SchemaError;
use crate::types::{Value, ValueType};
use std::collections::BTreeSet;

/// Decides which value categories may back a column.
///
/// Composite JSON documents are never eligible, whatever the allow-list says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    allowed: BTreeSet<ValueType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(ValueType::SCALARS)
    }
}

impl TypeRegistry {
    pub fn new(allowed: impl IntoIterator<Item = ValueType>) -> Self {
        Self {
            allowed: allowed.into_iter().filter(|t| t.is_scalar()).collect(),
        }
    }

    pub fn is_supported(&self, value_type: ValueType) -> bool {
        self.allowed.contains(&value_type)
    }

    /// Validate one field's value.
    ///
    /// Returns the category a column for it would have, or `None` for a null
    /// value (no type can be inferred from null). NaN and the infinities are
    /// rejected: SQLite would store NaN as NULL.
    pub fn check(&self, field: &str, value: &Value) -> Result<Option<ValueType>, SchemaError> {
        let Some(value_type) = value.value_type() else {
            return Ok(None);
        };
        if matches!(value, Value::Float(v) if !v.is_finite()) {
            return Err(SchemaError::NonFiniteFloat {
                field: field.to_string(),
            });
        }
        if self.is_supported(value_type) {
            Ok(Some(value_type))
        } else {
            Err(SchemaError::UnsupportedType {
                field: field.to_string(),
                type_name: value_type.to_string(),
            })
        }
    }

    pub fn allowed(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.allowed.iter().copied()
    }
}
