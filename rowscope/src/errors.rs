///
/// Error types for statement cursors, scope layouts, and row decoding.
///
/// - `EngineError`: the SQLite engine returned something other than a row or
///   completion while stepping. Terminal for the cursor that saw it.
/// - `LayoutError`: a scope adapter does not fit the statement's columns.
///   Raised while the adapter is attached, before any row is fetched.
/// - `DecodeError`: a row value could not be read as the requested type.
/// - `CursorError`: everything a cursor operation can fail with.
/// - `ConfigError`: the TOML configuration could not be loaded.
///

use std::path::PathBuf;
use thiserror::Error;

use crate::value::ValueKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SQLite error {code}: {message}")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Scopes request {requested} columns but only {available} are available")]
    NotEnoughColumns { requested: usize, available: usize },

    #[error("Column range {start}..{end} is out of bounds for {available} columns")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("Column index {index} is out of bounds for {available} columns")]
    IndexOutOfBounds { index: usize, available: usize },

    #[error("No column named '{column}' to expose as '{alias}'")]
    MissingColumn { column: String, alias: String },

    #[error("Duplicate scope name '{0}'")]
    DuplicateScope(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Column '{column}' holds {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: ValueKind,
    },

    #[error("Column '{column}' is NULL, expected {expected}")]
    UnexpectedNull {
        column: String,
        expected: &'static str,
    },

    #[error("No column named '{0}'")]
    NoSuchColumn(String),

    #[error("Column index {index} is out of range for a row of {len} columns")]
    ColumnIndexOutOfRange { index: usize, len: usize },

    #[error("No scope named '{0}'")]
    NoSuchScope(String),

    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Statement error: {0}")]
    Statement(String),

    #[error("Statement misuse: {0}")]
    Misuse(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
