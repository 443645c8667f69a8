//! Alias qualification of column references
//!
//! Rewrites bare (`COL`) and table-qualified (`TABLE.COL`) column references
//! in a SQL expression into alias-qualified form (`t2.COL`). A bare reference
//! binds to the first table of the definition. SQL keywords, function-call
//! heads, string literals and numeric literals are left untouched.
//!
//! The rewrite is not idempotent: a formula must be rewritten exactly once.

use crate::definition::Table;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Words never treated as column references
const BUILTIN_KEYWORDS: &[&str] = &[
    "ALL", "AND", "ANY", "AS", "ASC", "BETWEEN", "BIGINT", "BOOLEAN", "BY", "CASE", "CHAR",
    "CURRENT_DATE", "CURRENT_TIMESTAMP", "DECIMAL", "DESC", "DISTINCT", "ELSE", "END", "ESCAPE",
    "EXISTS", "FALSE", "FROM", "ILIKE", "IN", "INT", "INTEGER", "INTERVAL", "IS", "LIKE", "NOT",
    "NULL", "NUMERIC", "ON", "OR", "SELECT", "SMALLINT", "SOME", "THEN", "TRUE", "VARCHAR", "WHEN",
    "WHERE",
];

static REFERENCE_RE: OnceLock<Regex> = OnceLock::new();

/// Matches, in order of preference: a quoted string, a quoted identifier,
/// a numeric literal, or an optionally qualified identifier with an
/// optional opening parenthesis.
fn reference_regex() -> &'static Regex {
    REFERENCE_RE.get_or_init(|| {
        Regex::new(
            r#"(?x)
            (?P<literal>'(?:[^']|'')*'|"(?:[^"]|"")*"|\b\d[\w.]*)
            |
            \b(?:(?P<table>[A-Za-z][\w.]*)\s*\.\s*)?
            (?P<name>[A-Za-z]\w*)
            (?P<call>\s*\()?
            "#,
        )
        .expect("valid regex")
    })
}

/// Alias rewriter with a configurable keyword set
#[derive(Debug, Clone)]
pub struct AliasRewriter {
    keywords: HashSet<String>,
}

impl Default for AliasRewriter {
    fn default() -> Self {
        Self {
            keywords: BUILTIN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl AliasRewriter {
    /// Create a rewriter with the built-in keyword set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rewriter that also skips the given words
    pub fn with_keywords<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rewriter = Self::default();
        rewriter
            .keywords
            .extend(extra.into_iter().map(|k| k.as_ref().to_uppercase()));
        rewriter
    }

    /// Check whether a word is treated as a keyword (case-insensitive)
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word.to_uppercase())
    }

    /// Qualify every column reference in `formula` with its table alias.
    ///
    /// Qualifiers are matched against the table names without their schema
    /// prefix, case-insensitively; when a qualifier carries its own schema
    /// the last segment is tried as well. Unknown qualifiers are kept as
    /// written. With no tables the formula is returned unchanged.
    pub fn rewrite(&self, formula: &str, tables: &[Table]) -> String {
        let Some(first) = tables.first() else {
            return formula.to_string();
        };

        // Later tables win on name clashes
        let mut aliases: HashMap<String, &str> = HashMap::new();
        for table in tables {
            aliases.insert(table.bare_name().to_uppercase(), table.alias.as_str());
        }

        reference_regex()
            .replace_all(formula, |caps: &Captures| {
                let whole = &caps[0];
                if caps.name("literal").is_some() || caps.name("call").is_some() {
                    return whole.to_string();
                }
                let name = &caps["name"];
                if self.is_keyword(name) {
                    return whole.to_string();
                }
                match caps.name("table").map(|m| m.as_str()) {
                    None => format!("{}.{}", first.alias, name),
                    Some(qualifier) => {
                        let upper = qualifier.to_uppercase();
                        let bare = upper.rsplit('.').next().unwrap_or(&upper);
                        match aliases.get(&upper).or_else(|| aliases.get(bare)) {
                            Some(alias) => format!("{alias}.{name}"),
                            None => format!("{qualifier}.{name}"),
                        }
                    }
                }
            })
            .into_owned()
    }
}

/// Qualify column references using the built-in keyword set.
///
/// # Examples
/// ```
/// use cq_core::{insert_alias, Table};
///
/// let tables = vec![Table::base("ODS.BIDS", "t1"), Table::base("ODS.TRADER", "t2")];
/// assert_eq!(insert_alias("VOLUME > 0", &tables), "t1.VOLUME > 0");
/// assert_eq!(insert_alias("TRADER.TYPE = 100", &tables), "t2.TYPE = 100");
/// ```
pub fn insert_alias(formula: &str, tables: &[Table]) -> String {
    AliasRewriter::default().rewrite(formula, tables)
}

#[cfg(test)]
#[path = "alias_test.rs"]
mod tests;
