///
/// Column layout of a compiled statement: ordered names and column count.
///
/// The names come straight from the engine, so they are not unique when a
/// join selects several tables with a shared column name such as `id`.
/// Lookups by name return the first case-insensitive match, the way SQLite
/// itself resolves unqualified names.
///

use std::sync::Arc;

use crate::engine::StatementHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    names: Arc<[String]>,
}

impl ColumnLayout {
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads the column names of a compiled statement. Does not step it.
    pub fn from_statement<S: StatementHandle + ?Sized>(statement: &S) -> Self {
        Self::new((0..statement.column_count()).map(|i| statement.column_name(i)))
    }

    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }
}
