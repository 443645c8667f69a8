//! CLI command implementations

pub(crate) mod attributes;
pub(crate) mod common;
pub(crate) mod compile;
pub(crate) mod explain;
pub(crate) mod transforms;
