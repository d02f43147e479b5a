///
/// # rowscope: Scoped row access for SQLite result sets
///
/// Drives a compiled statement one row at a time and lets callers read each
/// row as a tree of named column scopes, so a single joined SELECT decodes
/// into nested records without changing its SQL.
///
/// ## Library Usage
///
/// ```rust,ignore
/// use rowscope::{ScopeAdapter, SqliteStatement, StatementCursor, splitting_adapters};
///
/// let stmt = SqliteStatement::compile(&conn, sql, &[])?;
/// let mut cursor = StatementCursor::open(stmt)?;
/// let adapters = splitting_adapters(&[2, 3], cursor.column_count())?;
/// let adapter = ScopeAdapter::scopes([
///     ("author", adapters[0].clone()),
///     ("book", adapters[1].clone()),
///     ("suffix", adapters[2].clone()),
/// ])?;
/// for row in cursor.adapted_rows(Some(adapter))? {
///     let row = row?;
///     let title: String = row.scoped("book").unwrap().get_named("title")?;
/// }
/// ```
///
/// ## Modules
///
/// - `cursor`: `StatementCursor` state machine and the `Rows` iterator
/// - `layout`: lazily read column names and count
/// - `adapter`: `ScopeAdapter` trees and `splitting_adapters`
/// - `row`: `RowView` scoped/unscoped access
/// - `value` / `decode`: typed values and the `FromRow` contract
/// - `sqlite`: raw SQLite `StatementHandle`
/// - `selection`: per-entity SELECT list helpers
/// - `config`: TOML access configuration
///

pub mod adapter;
pub mod config;
pub mod cursor;
pub mod decode;
pub mod engine;
pub mod errors;
pub mod layout;
pub mod row;
pub mod selection;
pub mod sqlite;
pub mod value;

pub use adapter::{ColumnSelection, ResolvedScope, ScopeAdapter, splitting_adapters};
pub use config::{AccessConfig, CursorConfig, DecodeConfig};
pub use cursor::{CursorState, Rows, StatementCursor, iterate};
pub use decode::FromRow;
pub use engine::{StatementHandle, Step};
pub use errors::{ConfigError, CursorError, DecodeError, EngineError, LayoutError};
pub use layout::ColumnLayout;
pub use row::RowView;
pub use selection::{TableSelection, quote_identifier};
pub use sqlite::SqliteStatement;
pub use value::{FromSqlValue, NumericPolicy, SqlValue, ValueKind};
