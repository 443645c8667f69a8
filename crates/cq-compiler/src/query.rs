//! SQL templates for folded operations and final statement assembly

use crate::error::{CompileError, CompileResult};
use crate::token::{Operation, OperationKind};
use cq_core::NamedSql;
use std::collections::BTreeSet;

/// An operand as seen by a composed query: its statement name and the
/// attribute names it exposes
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    pub name: &'a str,
    pub attributes: &'a [String],
}

/// The result of folding a run of same-precedence operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedQuery {
    pub name: String,
    pub sql: String,

    /// Attribute names exposed to further set operations
    pub attributes: Vec<String>,
}

impl ComposedQuery {
    /// Build a query from operators in source order and their operands.
    ///
    /// `operations[i]` is the operator written between `operands[i]` and
    /// `operands[i + 1]`.
    pub fn from_operations(
        name: impl Into<String>,
        operations: &[Operation],
        operands: &[Operand<'_>],
        join_placeholder: &str,
    ) -> CompileResult<Self> {
        let name = name.into();
        let Some(first) = operations.first() else {
            return Err(CompileError::syntax("no operation to fold"));
        };
        if operands.len() != operations.len() + 1 {
            return Err(CompileError::syntax(format!(
                "{} needs {} operands, found {}",
                first.kind.keyword(),
                operations.len() + 1,
                operands.len()
            )));
        }

        let (sql, attributes) = match first.kind {
            kind if kind.is_join() => (join_sql(operations, operands, join_placeholder), Vec::new()),
            OperationKind::Union | OperationKind::UnionAll => union_sql(operations, operands),
            OperationKind::Difference => {
                if operations.len() != 1 {
                    return Err(CompileError::Difference {
                        operands: operands.len(),
                    });
                }
                difference_sql(&operands[0], &operands[1])
            }
            _ => {
                return Err(CompileError::syntax(format!(
                    "{} cannot be compiled",
                    first.kind.keyword()
                )))
            }
        };

        Ok(Self {
            name,
            sql,
            attributes,
        })
    }
}

fn join_sql(operations: &[Operation], operands: &[Operand<'_>], placeholder: &str) -> String {
    let joins: Vec<String> = operations
        .iter()
        .zip(&operands[1..])
        .map(|(op, operand)| format!("{} {} ON {placeholder}", op.kind.keyword(), operand.name))
        .collect();
    format!("SELECT * FROM\n\t{}\n\t{}", operands[0].name, joins.join("\n\t"))
}

fn union_sql(operations: &[Operation], operands: &[Operand<'_>]) -> (String, Vec<String>) {
    let attributes: Vec<String> = operands
        .iter()
        .find(|o| !o.attributes.is_empty())
        .map(|o| o.attributes.to_vec())
        .unwrap_or_default();
    let projection = projection(&attributes);

    let mut sql = format!("SELECT {projection} FROM {}", operands[0].name);
    for (op, operand) in operations.iter().zip(&operands[1..]) {
        sql.push_str(&format!(
            "\n{}\nSELECT {projection} FROM {}",
            op.kind.keyword(),
            operand.name
        ));
    }
    (sql, attributes)
}

fn difference_sql(left: &Operand<'_>, right: &Operand<'_>) -> (String, Vec<String>) {
    let left_names: BTreeSet<&String> = left.attributes.iter().collect();
    let attributes: Vec<String> = right
        .attributes
        .iter()
        .filter(|a| left_names.contains(a))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();
    let a = projection(&attributes);
    let (l, r) = (left.name, right.name);

    let sql = format!(
        "SELECT {a} FROM\n    (SELECT {a} FROM {l} EXCEPT SELECT {a} FROM {r}) t1\n\
         UNION ALL\n\
         SELECT {a} FROM\n    (SELECT {a} FROM {r} EXCEPT SELECT {a} FROM {l}) t2"
    );
    (sql, attributes)
}

fn projection(attributes: &[String]) -> String {
    if attributes.is_empty() {
        "*".to_string()
    } else {
        attributes.join(", ")
    }
}

/// Assemble sub-statements in emission order into one statement.
///
/// All but the last become `WITH` entries; the last is the final select.
pub fn assemble(statements: &[NamedSql]) -> String {
    match statements {
        [] => String::new(),
        [single] => single.sql.clone(),
        [ctes @ .., last] => {
            let entries: Vec<String> = ctes
                .iter()
                .map(|q| format!("{} as (\n{}\n)", q.name, q.sql))
                .collect();
            format!("WITH\n{}\n{}", entries.join(",\n"), last.sql)
        }
    }
}
