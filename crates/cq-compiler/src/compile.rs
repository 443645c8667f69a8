//! RPN interpreter
//!
//! Folds an RPN sequence into SQL. Leaves and composed queries become
//! sub-statements in emission order; consecutive operators of equal
//! precedence fold into a single composed query.

use crate::error::{CompileError, CompileResult};
use crate::parser::MergeMode;
use crate::query::{assemble, ComposedQuery, Operand};
use crate::token::{Action, Operation, Token};
use cq_core::{AliasRewriter, Config, NamedSql, TableDefinition};
use cq_transform::TransformRegistry;
use std::collections::HashSet;

/// Settings that shape the generated SQL
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Predicate emitted after `ON` by the join template
    pub join_placeholder: String,

    /// Qualifies filters and attribute formulas
    pub rewriter: AliasRewriter,

    /// How adjacent leaves without an operator are combined
    pub mode: MergeMode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            join_placeholder: "a=a".to_string(),
            rewriter: AliasRewriter::default(),
            mode: MergeMode::Separate,
        }
    }
}

impl CompileOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            join_placeholder: config.join_placeholder.clone(),
            rewriter: config.alias_rewriter(),
            mode: MergeMode::from_flag(config.join_parts),
        }
    }
}

/// A sub-statement of the final query
#[derive(Debug)]
enum Statement {
    Definition(TableDefinition),
    Raw(NamedSql),
    Composed(ComposedQuery),
}

impl Statement {
    fn name(&self) -> &str {
        match self {
            Statement::Definition(def) => &def.name,
            Statement::Raw(raw) => &raw.name,
            Statement::Composed(query) => &query.name,
        }
    }
}

struct Compiler<'a> {
    registry: &'a TransformRegistry,
    options: &'a CompileOptions,
    /// Every emitted sub-statement, in order
    statements: Vec<Statement>,
    /// Attribute names exposed by each statement
    exposed: Vec<Vec<String>>,
    /// Operand stack of indices into `statements`
    stack: Vec<usize>,
    /// Pending operators of equal precedence, in RPN order
    run: Vec<Operation>,
}

/// Compile one RPN sequence into a SQL statement
pub fn compile_rpn(
    tokens: Vec<Token>,
    registry: &TransformRegistry,
    options: &CompileOptions,
) -> CompileResult<String> {
    if tokens.is_empty() {
        return Err(CompileError::EmptyAlgorithm);
    }

    let mut compiler = Compiler {
        registry,
        options,
        statements: Vec::new(),
        exposed: Vec::new(),
        stack: Vec::new(),
        run: Vec::new(),
    };
    for token in tokens {
        compiler.step(token)?;
    }
    compiler.finish()
}

impl Compiler<'_> {
    fn step(&mut self, token: Token) -> CompileResult<()> {
        match token {
            Token::Action(action) => {
                // A pending run means the action follows a closed bracket
                self.flush()?;
                self.apply(action)
            }
            Token::Operation(op) => {
                let same_run = self
                    .run
                    .last()
                    .is_some_and(|last| last.precedence() == op.precedence());
                if !same_run {
                    self.flush()?;
                }
                self.run.push(op);
                Ok(())
            }
            Token::Definition(def) => {
                self.flush()?;
                self.push(Statement::Definition(def));
                Ok(())
            }
            Token::Raw(raw) => {
                self.flush()?;
                self.push(Statement::Raw(raw));
                Ok(())
            }
        }
    }

    fn apply(&mut self, action: Action) -> CompileResult<()> {
        let Some(&top) = self.stack.last() else {
            return Err(CompileError::syntax(format!("{action} has no table to apply to")));
        };
        let def = match &mut self.statements[top] {
            Statement::Definition(def) => def,
            other => {
                return Err(CompileError::Mutation {
                    action: action.to_string(),
                    target: other.name().to_string(),
                })
            }
        };

        match action {
            Action::Filter(predicate) => def.add_filter(&predicate, &self.options.rewriter),
            Action::Transform(command) => self.registry.dispatch(def, &command)?,
            Action::With(block) => def.subqueries.push(block),
        }
        self.exposed[top] = def.attribute_names();
        Ok(())
    }

    fn push(&mut self, statement: Statement) {
        let exposed = match &statement {
            Statement::Definition(def) => def.attribute_names(),
            Statement::Raw(_) => Vec::new(),
            Statement::Composed(query) => query.attributes.clone(),
        };
        self.stack.push(self.statements.len());
        self.statements.push(statement);
        self.exposed.push(exposed);
    }

    /// Fold the pending run into one composed query
    fn flush(&mut self) -> CompileResult<()> {
        if self.run.is_empty() {
            return Ok(());
        }
        let needed = self.run.len() + 1;
        if self.stack.len() < needed {
            return Err(CompileError::syntax(format!(
                "{} needs {needed} operands, found {}",
                self.run[0].kind.keyword(),
                self.stack.len()
            )));
        }

        // Operators of one run sit on the RPN in reverse source order
        let mut operations = std::mem::take(&mut self.run);
        operations.reverse();

        let indices = self.stack.split_off(self.stack.len() - needed);
        let operands: Vec<Operand<'_>> = indices
            .iter()
            .map(|&i| Operand {
                name: self.statements[i].name(),
                attributes: &self.exposed[i],
            })
            .collect();

        let name = format!("subquery{}", self.statements.len() + 1);
        let query = ComposedQuery::from_operations(
            name,
            &operations,
            &operands,
            &self.options.join_placeholder,
        )?;
        log::trace!(
            "Folded {} operands with {} into {}",
            operands.len(),
            operations[0].kind.keyword(),
            query.name
        );
        self.push(Statement::Composed(query));
        Ok(())
    }

    fn finish(mut self) -> CompileResult<String> {
        self.flush()?;
        if self.stack.len() != 1 {
            return Err(CompileError::syntax(format!(
                "expected one query after folding, found {}; are operators missing?",
                self.stack.len()
            )));
        }

        let mut seen = HashSet::new();
        for statement in &self.statements {
            if !seen.insert(statement.name()) {
                log::warn!(
                    "'{}' appears more than once in one part; its WITH entry is repeated",
                    statement.name()
                );
            }
        }

        let rewriter = &self.options.rewriter;
        let statements: Vec<NamedSql> = self
            .statements
            .iter()
            .map(|s| match s {
                Statement::Definition(def) => NamedSql::new(def.name.as_str(), def.to_sql(rewriter)),
                Statement::Raw(raw) => raw.clone(),
                Statement::Composed(query) => NamedSql::new(query.name.as_str(), query.sql.as_str()),
            })
            .collect();
        Ok(assemble(&statements))
    }
}

#[cfg(test)]
#[path = "compile_test.rs"]
mod tests;
