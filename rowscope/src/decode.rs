///
/// Record decoding from row views.
///
/// The mapping layer implements `FromRow` for its record types and reads
/// scoped sub-views for joined records:
///
/// ```rust,ignore
/// impl FromRow for Author {
///     fn from_row(row: &RowView) -> Result<Self, DecodeError> {
///         Ok(Author {
///             id: row.get_named("id")?,
///             name: row.get_named("name")?,
///             book: row.decode_left_joined("book")?,
///         })
///     }
/// }
/// ```
///

use crate::errors::DecodeError;
use crate::row::RowView;

pub trait FromRow: Sized {
    fn from_row(row: &RowView) -> Result<Self, DecodeError>;
}

impl FromRow for RowView {
    fn from_row(row: &RowView) -> Result<Self, DecodeError> {
        Ok(row.clone())
    }
}

impl RowView {
    pub fn decode<T: FromRow>(&self) -> Result<T, DecodeError> {
        T::from_row(self)
    }

    /// Decodes a scope that must be defined by the adapter.
    pub fn decode_scope<T: FromRow>(&self, name: &str) -> Result<T, DecodeError> {
        let scope = self
            .scoped(name)
            .ok_or_else(|| DecodeError::NoSuchScope(name.to_string()))?;
        T::from_row(&scope)
    }

    /// Decodes a left-joined scope: `None` when the scope is not defined or
    /// the join found no record.
    pub fn decode_left_joined<T: FromRow>(&self, name: &str) -> Result<Option<T>, DecodeError> {
        match self.scoped(name) {
            Some(scope) if scope.has_match() => T::from_row(&scope).map(Some),
            _ => Ok(None),
        }
    }
}
