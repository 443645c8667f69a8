//! Table definitions: the leaf blocks of an algorithm
//!
//! A table definition starts from one base source table (alias `t1`) and its
//! expanded attributes. Action lines then mutate it: filters are appended,
//! transforms join further tables (`t2`, `t3`, ...), add attributes, or set
//! the GROUP BY list.

use crate::alias::AliasRewriter;
use crate::attribute::Attribute;
use serde::Serialize;

/// A source table participating in a definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Qualified source name (e.g. `ODS_001.TRADER`)
    pub name: String,

    /// Positional alias (`t1`, `t2`, ...)
    pub alias: String,

    /// FROM-clause fragment for this table
    pub join_clause: String,
}

impl Table {
    /// A base table rendered as `"<name> <alias>"`
    pub fn base(name: impl Into<String>, alias: impl Into<String>) -> Self {
        let name = name.into();
        let alias = alias.into();
        let join_clause = format!("{name} {alias}");
        Self {
            name,
            alias,
            join_clause,
        }
    }

    /// A table with an explicit join clause (e.g. `INNER JOIN ... ON ...`)
    pub fn joined(
        name: impl Into<String>,
        alias: impl Into<String>,
        join_clause: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            join_clause: join_clause.into(),
        }
    }

    /// Table name without its schema prefix
    pub fn bare_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A named SQL statement, rendered as one entry of a `WITH` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedSql {
    pub name: String,
    pub sql: String,
}

impl NamedSql {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// One algorithm block: a base table plus everything its actions added
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    /// Statement name (source line with `.` replaced by `_`)
    pub name: String,

    /// Projected attributes, in output order
    pub attributes: Vec<Attribute>,

    /// Base table first, then tables added by transforms
    pub tables: Vec<Table>,

    /// Alias-qualified WHERE predicates
    pub filters: Vec<String>,

    /// GROUP BY columns
    pub group_by: Vec<String>,

    /// Named statements emitted as a leading `WITH`
    pub subqueries: Vec<NamedSql>,
}

impl TableDefinition {
    /// Create a definition for a source table line
    pub fn new(source: &str, attributes: Vec<Attribute>) -> Self {
        Self {
            name: source.replace('.', "_"),
            attributes,
            tables: vec![Table::base(source, "t1")],
            filters: Vec::new(),
            group_by: Vec::new(),
            subqueries: Vec::new(),
        }
    }

    /// Alias the next added table will receive
    pub fn next_alias(&self) -> String {
        format!("t{}", self.tables.len() + 1)
    }

    /// Qualified name of the base table
    pub fn source(&self) -> &str {
        self.tables.first().map(|t| t.name.as_str()).unwrap_or("")
    }

    /// Qualify a predicate against the current tables and append it
    pub fn add_filter(&mut self, predicate: &str, rewriter: &AliasRewriter) {
        let qualified = rewriter.rewrite(predicate, &self.tables);
        self.filters.push(qualified);
    }

    /// Names of the projected attributes
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }

    /// Render the definition as a SELECT statement.
    ///
    /// Attribute formulas are alias-qualified here; filters were qualified
    /// when they were added.
    pub fn to_sql(&self, rewriter: &AliasRewriter) -> String {
        let mut sql = String::new();

        if !self.subqueries.is_empty() {
            let ctes: Vec<String> = self
                .subqueries
                .iter()
                .map(|q| format!("{} as (\n{}\n)", q.name, q.sql))
                .collect();
            sql.push_str("WITH\n");
            sql.push_str(&ctes.join(",\n"));
            sql.push('\n');
        }

        let projection = if self.attributes.is_empty() {
            "*".to_string()
        } else {
            self.attributes
                .iter()
                .map(|a| format!("{} as {}", rewriter.rewrite(&a.formula, &self.tables), a.name))
                .collect::<Vec<_>>()
                .join(",\n\t")
        };
        let from = self
            .tables
            .iter()
            .map(|t| t.join_clause.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        sql.push_str(&format!("SELECT\n\t{projection}\nFROM\n\t{from}"));

        if !self.filters.is_empty() {
            sql.push_str("\nWHERE\n\t");
            sql.push_str(&self.filters.join("\n\tAND "));
        }
        if !self.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        sql
    }
}
