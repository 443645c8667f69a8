//! Error types for cq-compiler

use cq_core::CoreError;
use cq_transform::TransformError;
use thiserror::Error;

/// Compilation errors
#[derive(Error, Debug)]
pub enum CompileError {
    /// Malformed algorithm text or RPN sequence (Q001)
    #[error("[Q001] Syntax error{}: {message}", at_line(.line))]
    Syntax {
        line: Option<usize>,
        message: String,
    },

    /// An action targeted a query that is no longer a table definition (Q002)
    #[error("[Q002] Cannot apply '{action}' to '{target}': only table definitions can be modified")]
    Mutation { action: String, target: String },

    /// DIFFERENCE used with other than two operands (Q003)
    #[error("[Q003] DIFFERENCE takes exactly two operands, got {operands}")]
    Difference { operands: usize },

    /// Algorithm contains no table definitions (Q004)
    #[error("[Q004] Algorithm is empty")]
    EmptyAlgorithm,

    /// Core error (Q005)
    #[error("[Q005] {0}")]
    Core(#[from] CoreError),

    /// Transform error (Q006)
    #[error("[Q006] {0}")]
    Transform(#[from] TransformError),
}

impl CompileError {
    /// Syntax error tied to a source line
    pub(crate) fn syntax_at(line: usize, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Syntax error found in an RPN sequence
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        CompileError::Syntax {
            line: None,
            message: message.into(),
        }
    }
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

/// Result type alias for CompileError
pub type CompileResult<T> = Result<T, CompileError>;
