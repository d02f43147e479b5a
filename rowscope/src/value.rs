///
/// SQL values and typed conversions.
///
/// Row values are `rusqlite::types::Value` (re-exported as `SqlValue`):
/// NULL, INTEGER, REAL, TEXT or BLOB. Typed reads go through `FromSqlValue`,
/// which never coerces across storage classes unless the numeric policy
/// explicitly allows integer → real widening.
///

use std::fmt;

use serde::Deserialize;

pub use rusqlite::types::Value as SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl ValueKind {
    pub fn of(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => ValueKind::Null,
            SqlValue::Integer(_) => ValueKind::Integer,
            SqlValue::Real(_) => ValueKind::Real,
            SqlValue::Text(_) => ValueKind::Text,
            SqlValue::Blob(_) => ValueKind::Blob,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "NULL",
            ValueKind::Integer => "INTEGER",
            ValueKind::Real => "REAL",
            ValueKind::Text => "TEXT",
            ValueKind::Blob => "BLOB",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How strictly numeric columns are converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    #[default]
    Strict,
    /// INTEGER values may also be read as `f64`.
    Widening,
}

/// Conversion from a single SQL value.
///
/// `from_sql_value` returns `None` when the stored value cannot represent
/// `Self`; the caller turns that into a `DecodeError` carrying the column name.
pub trait FromSqlValue: Sized {
    const EXPECTED: &'static str;

    fn from_sql_value(value: &SqlValue, policy: NumericPolicy) -> Option<Self>;
}

impl FromSqlValue for SqlValue {
    const EXPECTED: &'static str = "any value";

    fn from_sql_value(value: &SqlValue, _policy: NumericPolicy) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromSqlValue for i64 {
    const EXPECTED: &'static str = "INTEGER";

    fn from_sql_value(value: &SqlValue, _policy: NumericPolicy) -> Option<Self> {
        match value {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromSqlValue for i32 {
    const EXPECTED: &'static str = "32-bit INTEGER";

    fn from_sql_value(value: &SqlValue, policy: NumericPolicy) -> Option<Self> {
        i64::from_sql_value(value, policy).and_then(|i| i32::try_from(i).ok())
    }
}

impl FromSqlValue for u32 {
    const EXPECTED: &'static str = "unsigned 32-bit INTEGER";

    fn from_sql_value(value: &SqlValue, policy: NumericPolicy) -> Option<Self> {
        i64::from_sql_value(value, policy).and_then(|i| u32::try_from(i).ok())
    }
}

impl FromSqlValue for bool {
    const EXPECTED: &'static str = "INTEGER 0 or 1";

    fn from_sql_value(value: &SqlValue, _policy: NumericPolicy) -> Option<Self> {
        match value {
            SqlValue::Integer(0) => Some(false),
            SqlValue::Integer(1) => Some(true),
            _ => None,
        }
    }
}

impl FromSqlValue for f64 {
    const EXPECTED: &'static str = "REAL";

    fn from_sql_value(value: &SqlValue, policy: NumericPolicy) -> Option<Self> {
        match (value, policy) {
            (SqlValue::Real(f), _) => Some(*f),
            (SqlValue::Integer(i), NumericPolicy::Widening) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromSqlValue for String {
    const EXPECTED: &'static str = "TEXT";

    fn from_sql_value(value: &SqlValue, _policy: NumericPolicy) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<u8> {
    const EXPECTED: &'static str = "BLOB";

    fn from_sql_value(value: &SqlValue, _policy: NumericPolicy) -> Option<Self> {
        match value {
            SqlValue::Blob(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_sql_value(value: &SqlValue, policy: NumericPolicy) -> Option<Self> {
        match value {
            SqlValue::Null => Some(None),
            other => T::from_sql_value(other, policy).map(Some),
        }
    }
}
