//! cq-compiler - CellQL algorithm compiler
//!
//! Compilation runs in two stages: [`parse_parts`] reduces the algorithm
//! text to one RPN sequence per part, and [`compile_rpn`] folds each
//! sequence into a SQL statement. [`prepare`] runs both for a whole
//! document.

pub mod compile;
pub mod error;
pub mod parser;
pub mod query;
pub mod token;

pub use compile::{compile_rpn, CompileOptions};
pub use error::{CompileError, CompileResult};
pub use parser::{parse_parts, MergeMode, Parts};
pub use query::{ComposedQuery, Operand};
pub use token::{Action, Operation, OperationKind, Token};

use cq_core::{expand_attributes, AttributeMap, AttributeSpec};
use cq_transform::TransformRegistry;

/// Compiled SQL for one algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    /// One statement combining every part (merge mode)
    Single(String),
    /// One statement per part
    Parts(Vec<String>),
}

impl Prepared {
    /// All statements, in part order
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Prepared::Single(sql) => vec![sql.as_str()],
            Prepared::Parts(parts) => parts.iter().map(String::as_str).collect(),
        }
    }

    pub fn into_statements(self) -> Vec<String> {
        match self {
            Prepared::Single(sql) => vec![sql],
            Prepared::Parts(parts) => parts,
        }
    }
}

/// Expand attribute rows and compile an algorithm
pub fn prepare(
    specs: &[AttributeSpec],
    algorithm: &str,
    registry: &TransformRegistry,
    options: &CompileOptions,
) -> CompileResult<Prepared> {
    let attributes = expand_attributes(specs)?;
    prepare_with_attributes(&attributes, algorithm, registry, options)
}

/// Compile an algorithm against already expanded attributes
pub fn prepare_with_attributes(
    attributes: &AttributeMap,
    algorithm: &str,
    registry: &TransformRegistry,
    options: &CompileOptions,
) -> CompileResult<Prepared> {
    let mut parts = parse_parts(algorithm, attributes, options.mode);

    match options.mode {
        MergeMode::Merge => {
            let tokens = parts.next().ok_or(CompileError::EmptyAlgorithm)??;
            let sql = compile_rpn(tokens, registry, options)?;
            log::debug!("Compiled merged algorithm ({} bytes)", sql.len());
            Ok(Prepared::Single(sql))
        }
        MergeMode::Separate => {
            let mut statements = Vec::new();
            for tokens in parts {
                statements.push(compile_rpn(tokens?, registry, options)?);
                log::debug!("Compiled part {}", statements.len());
            }
            Ok(Prepared::Parts(statements))
        }
    }
}
