//! Lookup-join transforms declared in `cellql.yml`
//!
//! Each lookup joins one more table onto the definition with the next
//! positional alias, optionally exposes one of its columns as a new
//! primary-key attribute (`.get_x() as NAME`), and adds its filters.
//!
//! ```yaml
//! transforms:
//!   get_target_date:
//!     table: ODS_002.TRADE_SESSION
//!     on: "{{ base }}.TRADE_SESSION_ID = {{ alias }}.TRADE_SESSION_ID"
//!     value: TARGET_DATE
//! ```

use crate::call::{ArgValue, TransformCall};
use crate::error::{TransformError, TransformResult};
use crate::registry::TransformHandler;
use cq_core::{AliasRewriter, Attribute, LookupConfig, Table, TableDefinition};
use minijinja::{Environment, UndefinedBehavior, Value};
use std::collections::BTreeMap;

/// Keyword accepted by every lookup: an extra predicate qualified against
/// the lookup table
pub const ADDITION_FILTERS: &str = "addition_filters";

/// Template variable names that parameters may not shadow
const RESERVED_PARAMS: &[&str] = &["alias", "base", ADDITION_FILTERS];

/// A transform joining a configured lookup table
#[derive(Debug)]
pub struct LookupTransform {
    name: String,
    config: LookupConfig,
    rewriter: AliasRewriter,
    env: Environment<'static>,
}

impl LookupTransform {
    /// Build a lookup transform, checking that its templates compile
    pub fn new(
        name: impl Into<String>,
        config: LookupConfig,
        rewriter: AliasRewriter,
    ) -> TransformResult<Self> {
        let name = name.into();
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        if let Some(param) = config
            .param_names()
            .into_iter()
            .find(|p| RESERVED_PARAMS.contains(p))
        {
            return Err(TransformError::InvalidArgument {
                name,
                message: format!("parameter name '{param}' is reserved"),
            });
        }

        {
            let checker = Environment::new();
            let templates = std::iter::once(&config.on)
                .chain(config.value.as_ref())
                .chain(config.filters.iter());
            for source in templates {
                if let Err(e) = checker.template_from_str(source) {
                    return Err(TransformError::Render {
                        name,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            name,
            config,
            rewriter,
            env,
        })
    }

    /// Bind template variables: defaults, then positionals in declaration
    /// order, then keywords
    fn context(
        &self,
        call: &TransformCall,
        alias: &str,
        base: &str,
    ) -> TransformResult<BTreeMap<String, Value>> {
        let names = self.config.param_names();
        if call.args.len() > names.len() {
            return Err(self.invalid(format!(
                "expected at most {} positional arguments, got {}",
                names.len(),
                call.args.len()
            )));
        }

        let mut ctx: BTreeMap<String, Value> = self
            .config
            .params
            .iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), Value::from_serialize(v))))
            .collect();

        for (name, arg) in names.iter().zip(&call.args) {
            ctx.insert(name.to_string(), arg.to_value());
        }
        for (key, value) in &call.kwargs {
            if key == ADDITION_FILTERS {
                continue;
            }
            if !names.contains(&key.as_str()) {
                return Err(self.invalid(format!("unexpected keyword '{key}'")));
            }
            if names.iter().take(call.args.len()).any(|n| *n == key.as_str()) {
                return Err(self.invalid(format!("'{key}' given twice")));
            }
            ctx.insert(key.clone(), value.to_value());
        }

        ctx.insert("alias".to_string(), Value::from(alias));
        ctx.insert("base".to_string(), Value::from(base));
        Ok(ctx)
    }

    fn render(&self, template: &str, ctx: &BTreeMap<String, Value>) -> TransformResult<String> {
        self.env
            .render_str(template, ctx)
            .map(|s| s.trim().to_string())
            .map_err(|e| TransformError::Render {
                name: self.name.clone(),
                message: e.to_string(),
            })
    }

    fn invalid(&self, message: String) -> TransformError {
        TransformError::InvalidArgument {
            name: self.name.clone(),
            message,
        }
    }
}

impl TransformHandler for LookupTransform {
    fn apply(
        &self,
        def: &mut TableDefinition,
        call: &TransformCall,
        target: Option<&str>,
    ) -> TransformResult<()> {
        let alias = def.next_alias();
        let base = def
            .tables
            .first()
            .map(|t| t.alias.clone())
            .unwrap_or_else(|| "t1".to_string());
        let ctx = self.context(call, &alias, &base)?;

        let on = self.render(&self.config.on, &ctx)?;
        let table = Table::joined(
            self.config.table.as_str(),
            alias.as_str(),
            format!("\tINNER JOIN {} {alias} ON {on}", self.config.table),
        );

        let attribute = match target {
            Some(target) => {
                let value = self.config.value.as_ref().ok_or_else(|| {
                    self.invalid(format!("cannot be used with 'as {target}': no value declared"))
                })?;
                let column = self.render(value, &ctx)?;
                Some(Attribute::new(target, format!("{alias}.{column}"), true))
            }
            None => None,
        };

        let mut filters = Vec::new();
        for template in &self.config.filters {
            let rendered = self.render(template, &ctx)?;
            if !rendered.is_empty() {
                filters.push(rendered);
            }
        }
        match call.kwarg(ADDITION_FILTERS) {
            None | Some(ArgValue::None) => {}
            Some(value) => {
                let predicate = value.as_str().ok_or_else(|| {
                    self.invalid(format!("'{ADDITION_FILTERS}' must be a string, got {value}"))
                })?;
                filters.push(self.rewriter.rewrite(predicate, std::slice::from_ref(&table)));
            }
        }

        log::debug!(
            "Lookup {} joins {} as {alias} onto {}",
            self.name,
            self.config.table,
            def.name
        );
        def.tables.push(table);
        if let Some(attribute) = attribute {
            def.attributes.insert(0, attribute);
        }
        def.filters.extend(filters);
        Ok(())
    }

    fn describe(&self) -> String {
        let params = self.config.param_names();
        if params.is_empty() {
            format!("lookup join on {}", self.config.table)
        } else {
            format!("lookup join on {} ({})", self.config.table, params.join(", "))
        }
    }
}

#[cfg(test)]
#[path = "lookup_test.rs"]
mod tests;
