//! Error types for cq-transform

use thiserror::Error;

/// Transform dispatch errors
#[derive(Error, Debug)]
pub enum TransformError {
    /// Transform call text could not be parsed (T001)
    #[error("[T001] Cannot parse transform call '{text}': {message}")]
    Parse { text: String, message: String },

    /// No handler registered under the command name (T002)
    #[error("[T002] Unknown transform '{name}'. Run `cq transforms` to list registered transforms")]
    UnknownCommand { name: String },

    /// Handler rejected its arguments (T003)
    #[error("[T003] Invalid arguments for transform '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// Lookup template failed to render (T004)
    #[error("[T004] Template render error in transform '{name}': {message}")]
    Render { name: String, message: String },
}

/// Result type alias for TransformError
pub type TransformResult<T> = Result<T, TransformError>;
