//! RPN tokens produced by the parser and folded by the compiler

use cq_core::{NamedSql, TableDefinition};
use std::fmt;

/// Operator kinds, including the parser-internal part separator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    InnerJoin,
    LeftJoin,
    FullJoin,
    Union,
    UnionAll,
    Difference,
    Separator,
}

impl OperationKind {
    /// Binding strength; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            OperationKind::InnerJoin | OperationKind::LeftJoin | OperationKind::FullJoin => 4,
            OperationKind::Union | OperationKind::UnionAll => 3,
            OperationKind::Difference => 2,
            OperationKind::Separator => 1,
        }
    }

    /// SQL keyword emitted for this operator
    pub fn keyword(self) -> &'static str {
        match self {
            OperationKind::InnerJoin => "INNER JOIN",
            OperationKind::LeftJoin => "LEFT JOIN",
            OperationKind::FullJoin => "FULL JOIN",
            OperationKind::Union => "UNION",
            OperationKind::UnionAll => "UNION ALL",
            OperationKind::Difference => "DIFFERENCE",
            OperationKind::Separator => "SEPARATOR",
        }
    }

    pub fn is_join(self) -> bool {
        self.precedence() == 4
    }
}

/// An operator line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,

    /// Condition written after a join keyword (`INNER JOIN ON a.x = b.x`)
    pub on: Option<String>,
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        Self { kind, on: None }
    }

    pub fn precedence(&self) -> u8 {
        self.kind.precedence()
    }

    /// Recognize an operator line, case-insensitively.
    ///
    /// Join keywords may be followed by a condition, with or without a
    /// leading `ON`; the condition keeps its original spelling.
    pub fn parse(line: &str) -> Option<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let upper: Vec<String> = words.iter().map(|w| w.to_uppercase()).collect();

        match upper.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["UNION"] => return Some(Self::new(OperationKind::Union)),
            ["UNION", "ALL"] => return Some(Self::new(OperationKind::UnionAll)),
            ["DIFFERENCE"] => return Some(Self::new(OperationKind::Difference)),
            _ => {}
        }

        let kind = match upper.get(..2)? {
            [first, second] if second == "JOIN" => match first.as_str() {
                "INNER" => OperationKind::InnerJoin,
                "LEFT" => OperationKind::LeftJoin,
                "FULL" => OperationKind::FullJoin,
                _ => return None,
            },
            _ => return None,
        };

        let rest = match upper.get(2).map(String::as_str) {
            Some("ON") => &words[3..],
            _ => &words[2..],
        };
        let on = (!rest.is_empty()).then(|| rest.join(" "));
        Some(Self { kind, on })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.on {
            Some(on) => write!(f, "{} ON {on}", self.kind.keyword()),
            None => write!(f, "{}", self.kind.keyword()),
        }
    }
}

/// A modification applied to the open table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// WHERE predicate, alias-qualified when applied
    Filter(String),

    /// Transform command without its leading dots
    Transform(String),

    /// Named raw-SQL block emitted in the definition's leading `WITH`
    With(NamedSql),
}

impl Action {
    /// Classify an indented action line: a leading `.` marks a transform
    pub fn parse(line: &str) -> Self {
        let command = line.trim();
        match command.strip_prefix('.') {
            Some(_) => Action::Transform(command.trim_start_matches('.').trim_start().to_string()),
            None => Action::Filter(command.to_string()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Filter(predicate) => write!(f, "Filter: {predicate}"),
            Action::Transform(command) => write!(f, "Transform: {command}"),
            Action::With(block) => write!(f, "With: {}", block.name),
        }
    }
}

/// One item of an RPN sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Table definition leaf
    Definition(TableDefinition),

    /// Raw-SQL block leaf
    Raw(NamedSql),

    /// Operator
    Operation(Operation),

    /// Modification of the preceding definition
    Action(Action),
}

impl Token {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Token::Definition(_) | Token::Raw(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Definition(def) => write!(
                f,
                "Table: {} ({} attributes)",
                def.source(),
                def.attributes.len()
            ),
            Token::Raw(block) => write!(f, "Raw: {}", block.name),
            Token::Operation(op) => write!(f, "Operation: {op}"),
            Token::Action(action) => write!(f, "  {action}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_operations() {
        assert_eq!(Operation::parse("UNION").unwrap().kind, OperationKind::Union);
        assert_eq!(Operation::parse("union  all").unwrap().kind, OperationKind::UnionAll);
        assert_eq!(Operation::parse("Difference").unwrap().kind, OperationKind::Difference);
        assert!(Operation::parse("UNION DISTINCT").is_none());
        assert!(Operation::parse("ODS.UNION").is_none());
        assert!(Operation::parse("SEPARATOR").is_none());
    }

    #[test]
    fn test_parse_joins_with_condition() {
        let op = Operation::parse("inner join").unwrap();
        assert_eq!(op, Operation::new(OperationKind::InnerJoin));

        let op = Operation::parse("LEFT JOIN ON a.ID = b.ID").unwrap();
        assert_eq!(op.kind, OperationKind::LeftJoin);
        assert_eq!(op.on.as_deref(), Some("a.ID = b.ID"));
        assert_eq!(op.to_string(), "LEFT JOIN ON a.ID = b.ID");

        let op = Operation::parse("FULL JOIN on x=y").unwrap();
        assert_eq!(op.kind, OperationKind::FullJoin);
        assert_eq!(op.on.as_deref(), Some("x=y"));

        assert!(Operation::parse("CROSS JOIN").is_none());
        assert!(Operation::parse("INNER").is_none());
    }

    #[test]
    fn test_precedence_order() {
        let join = OperationKind::InnerJoin.precedence();
        let union = OperationKind::UnionAll.precedence();
        let diff = OperationKind::Difference.precedence();
        let sep = OperationKind::Separator.precedence();
        assert!(join > union && union > diff && diff > sep);
        assert_eq!(
            OperationKind::LeftJoin.precedence(),
            OperationKind::FullJoin.precedence()
        );
        assert!(OperationKind::FullJoin.is_join());
        assert!(!OperationKind::Union.is_join());
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            Action::parse("   VOLUME > 0"),
            Action::Filter("VOLUME > 0".to_string())
        );
        assert_eq!(
            Action::parse("  .group(by=[A])"),
            Action::Transform("group(by=[A])".to_string())
        );
        assert_eq!(
            Action::parse("..get_target_date() as D"),
            Action::Transform("get_target_date() as D".to_string())
        );
    }
}
