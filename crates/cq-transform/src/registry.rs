//! Transform handler registry
//!
//! The registry is built once (usually from `cellql.yml`) and passed to the
//! compiler by reference; handlers are looked up by command name.

use crate::builtins::GroupTransform;
use crate::call::{split_alias, TransformCall};
use crate::error::{TransformError, TransformResult};
use crate::lookup::LookupTransform;
use cq_core::{Config, TableDefinition};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A handler that mutates a table definition
pub trait TransformHandler: Send + Sync {
    /// Apply the call to the definition. `alias` is the target attribute
    /// name from a trailing `as ALIAS`, if any.
    fn apply(
        &self,
        def: &mut TableDefinition,
        call: &TransformCall,
        alias: Option<&str>,
    ) -> TransformResult<()>;

    /// One-line description for `cq transforms`
    fn describe(&self) -> String {
        String::new()
    }
}

impl<F> TransformHandler for F
where
    F: Fn(&mut TableDefinition, &TransformCall, Option<&str>) -> TransformResult<()> + Send + Sync,
{
    fn apply(
        &self,
        def: &mut TableDefinition,
        call: &TransformCall,
        alias: Option<&str>,
    ) -> TransformResult<()> {
        self(def, call, alias)
    }
}

/// Registry of transform handlers keyed by command name
#[derive(Clone, Default)]
pub struct TransformRegistry {
    handlers: BTreeMap<String, Arc<dyn TransformHandler>>,
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Create a registry holding only the built-in transforms
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("group", GroupTransform);
        registry
    }

    /// Create a registry with the built-ins plus every lookup transform
    /// declared in the configuration
    pub fn from_config(config: &Config) -> TransformResult<Self> {
        let mut registry = Self::with_builtins();
        let rewriter = config.alias_rewriter();
        for (name, lookup) in &config.transforms {
            let handler = LookupTransform::new(name, lookup.clone(), rewriter.clone())?;
            registry.register(name.clone(), handler);
        }
        log::debug!(
            "Registered {} transforms ({} from config)",
            registry.len(),
            config.transforms.len()
        );
        Ok(registry)
    }

    /// Register a handler, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, handler: impl TransformHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Get the handler for a command
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TransformHandler>> {
        self.handlers.get(name)
    }

    /// Registered names with their descriptions, sorted by name
    pub fn list(&self) -> Vec<(&str, String)> {
        self.handlers
            .iter()
            .map(|(name, handler)| (name.as_str(), handler.describe()))
            .collect()
    }

    /// Get the number of registered transforms
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Parse a transform command (without its leading dots) and apply it
    pub fn dispatch(&self, def: &mut TableDefinition, command: &str) -> TransformResult<()> {
        let (text, alias) = split_alias(command.trim());
        let call = TransformCall::parse(text)?;
        let handler = self
            .get(&call.name)
            .ok_or_else(|| TransformError::UnknownCommand {
                name: call.name.clone(),
            })?;
        log::trace!("Applying transform {call} to {}", def.name);
        handler.apply(def, &call, alias)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
