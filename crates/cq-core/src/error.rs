//! Error types for cq-core

use thiserror::Error;

/// Core error type for CellQL
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Attribute schema/table/field rows are not aligned
    #[error(
        "[C003] Attribute '{name}' has misaligned rows: {schemas} schema, {tables} table, {fields} field"
    )]
    AttributeShape {
        name: String,
        schemas: usize,
        tables: usize,
        fields: usize,
    },

    /// C004: IO error with file path context
    #[error("[C004] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C005: YAML parse error
    #[error("[C005] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// C006: JSON parse error
    #[error("[C006] JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
