//! Algorithm text to RPN
//!
//! The parser classifies each line and runs an operator-precedence
//! (shunting-yard) reduction. Line kinds:
//!
//! - `# ...` comments and blank lines are ignored
//! - an indented line is an action on the preceding table definition
//! - `(` and `)` group operands
//! - `INNER JOIN`, `LEFT JOIN`, `FULL JOIN`, `UNION`, `UNION ALL`,
//!   `DIFFERENCE` are operators
//! - `name AS (` opens a raw SQL block, closed by a line starting with `)`
//! - anything else names a source table
//!
//! Two leaves with no operator between them are joined by the implicit
//! operator: a part separator, or `FULL JOIN` in merge mode. Each part is
//! yielded as its own RPN sequence.

use crate::error::{CompileError, CompileResult};
use crate::token::{Action, Operation, OperationKind, Token};
use cq_core::{AttributeMap, NamedSql, TableDefinition};
use std::iter::Enumerate;
use std::str::Lines;

/// What two adjacent leaves are combined with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Each part compiles to its own statement
    #[default]
    Separate,
    /// Parts are combined with `FULL JOIN` into one statement
    Merge,
}

impl MergeMode {
    pub fn from_flag(join_parts: bool) -> Self {
        if join_parts {
            MergeMode::Merge
        } else {
            MergeMode::Separate
        }
    }

    fn implicit_operation(self) -> Operation {
        match self {
            MergeMode::Separate => Operation::new(OperationKind::Separator),
            MergeMode::Merge => Operation::new(OperationKind::FullJoin),
        }
    }
}

/// Parse an algorithm into one RPN sequence per part
pub fn parse_parts<'a>(text: &'a str, attributes: &'a AttributeMap, mode: MergeMode) -> Parts<'a> {
    Parts {
        lines: text.lines().enumerate(),
        attributes,
        mode,
        output: Vec::new(),
        stack: Vec::new(),
        last: Last::Nothing,
        block: None,
        yielded: false,
        finished: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Nothing,
    Definition,
    Raw,
    Operation,
}

#[derive(Debug)]
enum StackItem {
    /// Open bracket with the output length at the time it was pushed
    Bracket { mark: usize, line: usize },
    Op(Operation),
}

/// A raw SQL block being collected
#[derive(Debug)]
struct OpenBlock {
    /// Index of the block's token in the output
    index: usize,
    line: usize,
    /// Indentation of the opening line for blocks nested in a definition
    indent: Option<usize>,
    body: Vec<String>,
}

impl OpenBlock {
    fn closes_on(&self, line: &str) -> bool {
        match self.indent {
            None => line.starts_with(')'),
            Some(indent) => {
                let rest = line.trim_start();
                rest.starts_with(')') && line.len() - rest.len() <= indent
            }
        }
    }
}

/// Iterator over the RPN sequences of an algorithm, one per part
#[derive(Debug)]
pub struct Parts<'a> {
    lines: Enumerate<Lines<'a>>,
    attributes: &'a AttributeMap,
    mode: MergeMode,
    output: Vec<Token>,
    stack: Vec<StackItem>,
    last: Last,
    block: Option<OpenBlock>,
    yielded: bool,
    finished: bool,
}

impl Iterator for Parts<'_> {
    type Item = CompileResult<Vec<Token>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.advance();
        match result {
            Ok(Some(part)) => {
                self.yielded = true;
                log::trace!("Parsed part with {} tokens", part.len());
                Some(Ok(part))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl Parts<'_> {
    fn advance(&mut self) -> CompileResult<Option<Vec<Token>>> {
        while let Some((index, line)) = self.lines.next() {
            if let Some(part) = self.feed(index + 1, line)? {
                return Ok(Some(part));
            }
        }
        let part = self.finish()?;
        self.finished = true;
        Ok(part)
    }

    fn feed(&mut self, number: usize, raw_line: &str) -> CompileResult<Option<Vec<Token>>> {
        if let Some(block) = self.block.as_mut() {
            if block.closes_on(raw_line) {
                self.close_block();
            } else {
                block.body.push(raw_line.to_string());
            }
            return Ok(None);
        }

        let line = raw_line.split('#').next().unwrap_or("").trim_end();
        if line.is_empty() {
            return Ok(None);
        }

        if line.starts_with(char::is_whitespace) {
            self.push_action(number, line)?;
            return Ok(None);
        }

        match line {
            "(" => {
                self.stack.push(StackItem::Bracket {
                    mark: self.output.len(),
                    line: number,
                });
                return Ok(None);
            }
            ")" => {
                self.close_bracket(number)?;
                return Ok(None);
            }
            _ => {}
        }

        if let Some(op) = Operation::parse(line) {
            self.push_operation(op);
            self.last = Last::Operation;
            return Ok(None);
        }

        let mut part = None;
        if matches!(self.last, Last::Definition | Last::Raw) {
            let implicit = self.mode.implicit_operation();
            if implicit.kind == OperationKind::Separator {
                part = Some(self.split_part());
            } else {
                self.push_operation(implicit);
            }
        }

        match raw_block_name(line) {
            Some(name) => {
                self.block = Some(OpenBlock {
                    index: self.output.len(),
                    line: number,
                    indent: None,
                    body: Vec::new(),
                });
                self.output.push(Token::Raw(NamedSql::new(name, "")));
                self.last = Last::Raw;
            }
            None => {
                let attributes = self.attributes.get(line).to_vec();
                if attributes.is_empty() {
                    log::warn!("No attributes mapped for table '{line}' (line {number})");
                }
                self.output
                    .push(Token::Definition(TableDefinition::new(line, attributes)));
                self.last = Last::Definition;
            }
        }
        Ok(part)
    }

    fn push_action(&mut self, number: usize, line: &str) -> CompileResult<()> {
        if self.last != Last::Definition {
            return Err(CompileError::syntax_at(
                number,
                "indented action without a table definition to apply it to",
            ));
        }
        let command = line.trim();
        match raw_block_name(command) {
            Some(name) => {
                self.block = Some(OpenBlock {
                    index: self.output.len(),
                    line: number,
                    indent: Some(line.len() - line.trim_start().len()),
                    body: Vec::new(),
                });
                self.output
                    .push(Token::Action(Action::With(NamedSql::new(name.trim(), ""))));
            }
            None => self.output.push(Token::Action(Action::parse(command))),
        }
        Ok(())
    }

    fn close_block(&mut self) {
        let Some(block) = self.block.take() else {
            return;
        };
        let body: String = block.body.iter().map(|line| format!("{line}\n")).collect();
        match self.output.get_mut(block.index) {
            Some(Token::Raw(named)) | Some(Token::Action(Action::With(named))) => named.sql = body,
            _ => {}
        }
    }

    fn close_bracket(&mut self, number: usize) -> CompileResult<()> {
        loop {
            match self.stack.pop() {
                Some(StackItem::Op(op)) => self.output.push(Token::Operation(op)),
                Some(StackItem::Bracket { .. }) => return Ok(()),
                None => return Err(CompileError::syntax_at(number, "unmatched ')'")),
            }
        }
    }

    /// Pop operators binding strictly tighter than `op`, then push it
    fn push_operation(&mut self, op: Operation) {
        while let Some(StackItem::Op(top)) = self.stack.last() {
            if top.precedence() <= op.precedence() {
                break;
            }
            if let Some(StackItem::Op(top)) = self.stack.pop() {
                self.output.push(Token::Operation(top));
            }
        }
        self.stack.push(StackItem::Op(op));
    }

    /// Close the current part at a separator.
    ///
    /// Operators still open around the separator are replicated into the
    /// finished part and stay on the stack, so the next part is built against
    /// the same left-hand context: the output preceding the innermost open
    /// bracket.
    fn split_part(&mut self) -> Vec<Token> {
        let separator = OperationKind::Separator.precedence();
        while let Some(StackItem::Op(top)) = self.stack.last() {
            if top.precedence() <= separator {
                break;
            }
            if let Some(StackItem::Op(top)) = self.stack.pop() {
                self.output.push(Token::Operation(top));
            }
        }

        let open: Vec<Operation> = self
            .stack
            .iter()
            .rev()
            .filter_map(|item| match item {
                StackItem::Op(op) => Some(op.clone()),
                StackItem::Bracket { .. } => None,
            })
            .collect();

        let mark = if open.is_empty() {
            0
        } else {
            self.stack
                .iter()
                .rev()
                .find_map(|item| match item {
                    StackItem::Bracket { mark, .. } => Some(*mark),
                    StackItem::Op(_) => None,
                })
                .unwrap_or(0)
        };

        self.output.extend(open.into_iter().map(Token::Operation));
        let prefix = self.output[..mark.min(self.output.len())].to_vec();
        std::mem::replace(&mut self.output, prefix)
    }

    fn finish(&mut self) -> CompileResult<Option<Vec<Token>>> {
        if let Some(block) = &self.block {
            return Err(CompileError::syntax_at(
                block.line,
                "raw SQL block is never closed with ')'",
            ));
        }
        while let Some(item) = self.stack.pop() {
            match item {
                StackItem::Op(op) => self.output.push(Token::Operation(op)),
                StackItem::Bracket { line, .. } => {
                    return Err(CompileError::syntax_at(line, "unmatched '('"));
                }
            }
        }
        if self.output.is_empty() {
            return if self.yielded {
                Ok(None)
            } else {
                Err(CompileError::EmptyAlgorithm)
            };
        }
        Ok(Some(std::mem::take(&mut self.output)))
    }
}

/// Name of a raw SQL block opened by `name AS (`, matched case-insensitively
fn raw_block_name(line: &str) -> Option<&str> {
    const SUFFIX: &str = " AS (";
    let split = line.len().checked_sub(SUFFIX.len())?;
    if line.is_char_boundary(split) && line[split..].eq_ignore_ascii_case(SUFFIX) {
        Some(&line[..split])
    } else {
        None
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
