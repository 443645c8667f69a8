//! Tabular attribute specifications and their expansion per source table
//!
//! Attribute specs arrive in spreadsheet form: one record per target
//! attribute, with row-aligned `source_schema`, `source_table` and
//! `source_field` text blocks. Each line of those blocks is a row group.
//! Within a group, schema and table may list comma-separated alternatives
//! that are combined by cross product, so
//!
//! ```text
//! source_schema: "s1, s2"
//! source_table:  "t1, t2"
//! source_field:  "a"
//! ```
//!
//! maps `a` onto `S1.T1`, `S1.T2`, `S2.T1` and `S2.T2`.

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// A line break followed by four or more spaces continues the previous field line
static FIELD_CONTINUATION_RE: OnceLock<Regex> = OnceLock::new();

fn field_continuation_regex() -> &'static Regex {
    FIELD_CONTINUATION_RE
        .get_or_init(|| Regex::new(r"(?:\r\n|\n\r|\n|\r) {4,}").expect("valid regex"))
}

/// One attribute record as exported from the mapping spreadsheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    /// Target attribute name
    pub name: String,

    /// Whether the attribute is part of the primary key
    #[serde(default, deserialize_with = "crate::serde_helpers::flag")]
    pub is_pk: bool,

    /// Source schema row groups (comma-separated alternatives per line)
    pub source_schema: String,

    /// Source table row groups (comma-separated alternatives per line)
    pub source_table: String,

    /// Source column expression per row group (continuation lines indented by 4+ spaces)
    pub source_field: String,
}

/// A resolved attribute of a table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Target name, uppercased
    pub name: String,

    /// SQL expression producing the attribute
    pub formula: String,

    /// Primary key flag
    pub is_pk: bool,
}

impl Attribute {
    /// Create a new attribute
    pub fn new(name: impl Into<String>, formula: impl Into<String>, is_pk: bool) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            is_pk,
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Expanded attributes keyed by `"SCHEMA.TABLE"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributeMap {
    tables: BTreeMap<String, Vec<Attribute>>,
}

impl AttributeMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes of a table, looked up by exact key. Unknown tables have none.
    pub fn get(&self, table: &str) -> &[Attribute] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the map has an entry for the table
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Append an attribute to a table, preserving insertion order
    pub fn push(&mut self, table: impl Into<String>, attribute: Attribute) {
        self.tables.entry(table.into()).or_default().push(attribute);
    }

    /// Iterate over tables in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Attribute])> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Split a text block into row groups, ignoring trailing blank lines
fn row_groups(block: &str) -> Vec<&str> {
    block
        .trim_end_matches(|c: char| c == '\n' || c == '\r' || c == ' ' || c == '\t')
        .lines()
        .collect()
}

/// Expand tabular attribute specs into per-table attribute lists.
///
/// Fails with [`CoreError::AttributeShape`] when an attribute's schema,
/// table and field row groups have different counts.
pub fn expand_attributes(specs: &[AttributeSpec]) -> CoreResult<AttributeMap> {
    let mut map = AttributeMap::new();

    for spec in specs {
        let schemas = row_groups(&spec.source_schema);
        let tables = row_groups(&spec.source_table);
        let folded = field_continuation_regex().replace_all(&spec.source_field, " ");
        let fields = row_groups(&folded);

        if schemas.len() != tables.len() || tables.len() != fields.len() {
            return Err(CoreError::AttributeShape {
                name: spec.name.clone(),
                schemas: schemas.len(),
                tables: tables.len(),
                fields: fields.len(),
            });
        }

        let name = spec.name.to_uppercase();
        for ((schema_list, table_list), field) in schemas.iter().zip(&tables).zip(&fields) {
            for schema in schema_list.split(',') {
                for table in table_list.split(',') {
                    let key = format!(
                        "{}.{}",
                        schema.trim().to_uppercase(),
                        table.trim().to_uppercase()
                    );
                    map.push(key, Attribute::new(name.clone(), *field, spec.is_pk));
                }
            }
        }
    }

    log::debug!(
        "Expanded {} attribute specs into {} tables",
        specs.len(),
        map.len()
    );
    Ok(map)
}

/// Load attribute specs from a YAML or JSON file.
///
/// Files with a `.json` extension are parsed as JSON; everything else as YAML.
/// The document must be a list of attribute records.
pub fn load_attribute_specs(path: &Path) -> CoreResult<Vec<AttributeSpec>> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let specs = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(specs)
}

#[cfg(test)]
#[path = "attribute_test.rs"]
mod tests;
