///
/// Per-entity column selections.
///
/// Records mapped to a table describe which of its columns they select.
/// The description serves two purposes when several records are selected
/// back to back in one query:
///
/// - `selection_sql` renders the record's part of the SELECT list
///   (`"t1".*` or `"t3"."t1id", "t3"."name"`), optionally under a table alias;
/// - `selected_column_count` tells `splitting_adapters` how many result
///   columns belong to the record.
///

use rusqlite::Connection;

use crate::engine::StatementHandle;
use crate::errors::CursorError;
use crate::sqlite::SqliteStatement;

pub trait TableSelection {
    const TABLE_NAME: &'static str;

    /// Explicit column list, or `None` to select every column.
    fn selected_columns() -> Option<&'static [&'static str]> {
        None
    }

    fn selection_sql(alias: Option<&str>) -> String {
        let qualifier = quote_identifier(alias.unwrap_or(Self::TABLE_NAME));
        match Self::selected_columns() {
            None => format!("{}.*", qualifier),
            Some(columns) => columns
                .iter()
                .map(|column| format!("{}.{}", qualifier, quote_identifier(column)))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Number of result columns this record occupies in a query built with
    /// `selection_sql`.
    fn selected_column_count(conn: &Connection) -> Result<usize, CursorError> {
        if let Some(columns) = Self::selected_columns() {
            return Ok(columns.len());
        }
        let sql = format!("SELECT * FROM {}", quote_identifier(Self::TABLE_NAME));
        let statement = SqliteStatement::prepare(conn, &sql)?;
        Ok(statement.column_count())
    }
}

/// Double-quotes an SQL identifier, escaping embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
