///
/// # Row Views
///
/// A `RowView` is one materialized result row seen through a resolved scope.
/// Values are copied out of the statement when the cursor steps, so a view
/// stays valid (and unchanged) after the cursor moves on. Scoped and unscoped
/// views of the same row share the value storage.
///
/// ## Scopes
///
/// `scoped(name)` returns `None` only when the adapter never defined `name`.
/// A scope over a left-joined table without a match is still present; its
/// columns are all NULL. `has_match()` tells the two situations apart for
/// decoders of optional joined records.
///
/// ## Names
///
/// Inside a scope, names are whatever the scope exposes. Unscoped lookups by
/// name return the first match, so rows with duplicated column names should
/// be read through scopes or by position.
///

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use crate::adapter::ResolvedScope;
use crate::errors::DecodeError;
use crate::value::{FromSqlValue, NumericPolicy, SqlValue, ValueKind};

#[derive(Clone)]
pub struct RowView {
    values: Arc<[SqlValue]>,
    scope: Arc<ResolvedScope>,
    unscoped: Arc<ResolvedScope>,
    policy: NumericPolicy,
}

impl RowView {
    pub(crate) fn new(
        values: Arc<[SqlValue]>,
        scope: Arc<ResolvedScope>,
        unscoped: Arc<ResolvedScope>,
        policy: NumericPolicy,
    ) -> Self {
        Self {
            values,
            scope,
            unscoped,
            policy,
        }
    }

    fn with_scope(&self, scope: Arc<ResolvedScope>) -> Self {
        Self {
            values: Arc::clone(&self.values),
            scope,
            unscoped: Arc::clone(&self.unscoped),
            policy: self.policy,
        }
    }

    pub fn len(&self) -> usize {
        self.scope.columns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn numeric_policy(&self) -> NumericPolicy {
        self.policy
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.scope.columns().iter().map(|c| &*c.name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.scope
            .columns()
            .iter()
            .map(|c| (&*c.name, &self.values[c.index]))
    }

    pub fn value(&self, index: usize) -> Option<&SqlValue> {
        let column = self.scope.columns().get(index)?;
        self.values.get(column.index)
    }

    pub fn value_named(&self, name: &str) -> Option<&SqlValue> {
        let index = self.position(name)?;
        self.value(index)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.scope
            .columns()
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn get<T: FromSqlValue>(&self, index: usize) -> Result<T, DecodeError> {
        let column = self
            .scope
            .columns()
            .get(index)
            .ok_or(DecodeError::ColumnIndexOutOfRange {
                index,
                len: self.len(),
            })?;
        self.convert(&column.name, &self.values[column.index])
    }

    pub fn get_named<T: FromSqlValue>(&self, name: &str) -> Result<T, DecodeError> {
        let index = self
            .position(name)
            .ok_or_else(|| DecodeError::NoSuchColumn(name.to_string()))?;
        self.get(index)
    }

    fn convert<T: FromSqlValue>(&self, column: &str, value: &SqlValue) -> Result<T, DecodeError> {
        T::from_sql_value(value, self.policy).ok_or_else(|| match value {
            SqlValue::Null => DecodeError::UnexpectedNull {
                column: column.to_string(),
                expected: T::EXPECTED,
            },
            other => DecodeError::TypeMismatch {
                column: column.to_string(),
                expected: T::EXPECTED,
                found: ValueKind::of(other),
            },
        })
    }

    pub fn scoped(&self, name: &str) -> Option<RowView> {
        self.scope
            .scope(name)
            .map(|scope| self.with_scope(Arc::clone(scope)))
    }

    pub fn scoped_path(&self, path: &[&str]) -> Option<RowView> {
        path.iter()
            .try_fold(self.clone(), |view, name| view.scoped(name))
    }

    /// All physical columns of the row in statement order, whatever the
    /// adapter.
    pub fn unscoped(&self) -> RowView {
        self.with_scope(Arc::clone(&self.unscoped))
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scope.scope_names()
    }

    pub fn has_scopes(&self) -> bool {
        self.scope.has_scopes()
    }

    pub fn contains_non_null_value(&self) -> bool {
        self.columns().any(|(_, v)| !matches!(v, SqlValue::Null))
    }

    /// Whether a left join produced a record for this view: any of its own
    /// columns is not NULL, or any nested scope matches.
    pub fn has_match(&self) -> bool {
        self.contains_non_null_value()
            || self
                .scope
                .scope_names()
                .filter_map(|name| self.scoped(name))
                .any(|view| view.has_match())
    }

    pub fn to_values(&self) -> Vec<SqlValue> {
        self.columns().map(|(_, v)| v.clone()).collect()
    }

    pub fn to_pairs(&self) -> Vec<(String, SqlValue)> {
        self.columns()
            .map(|(name, v)| (name.to_string(), v.clone()))
            .collect()
    }
}

impl Index<usize> for RowView {
    type Output = SqlValue;

    fn index(&self, index: usize) -> &SqlValue {
        match self.value(index) {
            Some(value) => value,
            None => panic!(
                "column index {} out of range for a row of {} columns",
                index,
                self.len()
            ),
        }
    }
}

/// Two views are equal when they expose the same names and values in the
/// same order.
impl PartialEq for RowView {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.columns().eq(other.columns())
    }
}

impl fmt::Debug for RowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.columns() {
            map.entry(&name, value);
        }
        for name in self.scope_names() {
            if let Some(view) = self.scoped(name) {
                map.entry(&format_args!("@{}", name), &view);
            }
        }
        map.finish()
    }
}
