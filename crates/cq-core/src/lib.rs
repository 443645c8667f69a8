//! cq-core - Core library for CellQL
//!
//! This crate provides the shared data model (attributes, tables, table
//! definitions), `cellql.yml` configuration parsing, the tabular attribute
//! expansion, and the alias-qualification rewriter used when emitting SQL.

pub mod alias;
pub mod attribute;
pub mod config;
pub mod definition;
pub mod error;
pub(crate) mod serde_helpers;

pub use alias::{insert_alias, AliasRewriter};
pub use attribute::{expand_attributes, load_attribute_specs, Attribute, AttributeMap, AttributeSpec};
pub use config::{Config, LookupConfig};
pub use definition::{NamedSql, Table, TableDefinition};
pub use error::{CoreError, CoreResult};
