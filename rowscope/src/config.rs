///
/// # Access Configuration
///
/// Optional TOML configuration for cursors. Every field has a default, so an
/// empty document is valid; unknown keys are rejected.
///
/// ```toml
/// [cursor]
/// trace_rows = true      # log every materialized row at TRACE level
///
/// [decode]
/// numeric = "widening"   # "strict" (default) or "widening"
/// ```
///

use std::path::Path;

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::value::NumericPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    pub cursor: CursorConfig,
    pub decode: DecodeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CursorConfig {
    pub trace_rows: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    pub numeric: NumericPolicy,
}

impl AccessConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
