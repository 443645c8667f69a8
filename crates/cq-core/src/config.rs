//! Configuration types and parsing for cellql.yml

use crate::alias::AliasRewriter;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Transform names reserved for built-in handlers
pub const RESERVED_TRANSFORMS: &[&str] = &["group"];

/// Main project configuration from cellql.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Combine all parts of an algorithm with FULL JOIN by default
    #[serde(default)]
    pub join_parts: bool,

    /// Predicate emitted after `ON` by the join template
    #[serde(default = "default_join_placeholder")]
    pub join_placeholder: String,

    /// Default attribute file, relative to the project directory
    #[serde(default)]
    pub attributes: Option<String>,

    /// Output directory for compiled SQL
    #[serde(default = "default_target_path")]
    pub target_path: String,

    /// Additional words the alias rewriter must not qualify
    #[serde(default)]
    pub extra_keywords: Vec<String>,

    /// Lookup-join transforms, keyed by command name
    #[serde(default)]
    pub transforms: BTreeMap<String, LookupConfig>,
}

/// A lookup-join transform declared in configuration.
///
/// `on`, `value` and each entry of `filters` are minijinja templates
/// rendered with `alias` (the alias of the joined table), `base` (the alias
/// of the definition's base table) and every declared parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupConfig {
    /// Qualified lookup table name
    pub table: String,

    /// Join predicate template
    pub on: String,

    /// Column template exposed when the call carries `as ALIAS`
    #[serde(default)]
    pub value: Option<String>,

    /// Parameters in positional order, with their defaults
    #[serde(default)]
    pub params: serde_yaml::Mapping,

    /// Filter templates; entries rendering to an empty string are skipped
    #[serde(default)]
    pub filters: Vec<String>,
}

impl LookupConfig {
    /// Declared parameter names in positional order
    pub fn param_names(&self) -> Vec<&str> {
        self.params.keys().filter_map(|k| k.as_str()).collect()
    }
}

fn default_join_placeholder() -> String {
    "a=a".to_string()
}

fn default_target_path() -> String {
    "target".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "cellql".to_string(),
            join_parts: false,
            join_placeholder: default_join_placeholder(),
            attributes: None,
            target_path: default_target_path(),
            extra_keywords: Vec::new(),
            transforms: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for cellql.yml or cellql.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("cellql.yml");
        let yaml_path = dir.join("cellql.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.join_placeholder.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "join_placeholder cannot be empty".to_string(),
            });
        }

        for (name, lookup) in &self.transforms {
            if !is_identifier(name) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Transform name '{name}' is not a valid identifier"),
                });
            }
            if RESERVED_TRANSFORMS.contains(&name.as_str()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Transform name '{name}' is reserved for a built-in"),
                });
            }
            if lookup.table.trim().is_empty() || lookup.on.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Transform '{name}' requires non-empty 'table' and 'on'"),
                });
            }
            if let Some(key) = lookup.params.keys().find(|k| !k.is_string()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Transform '{name}' has a non-string parameter name: {key:?}"),
                });
            }
        }

        Ok(())
    }

    /// Absolute path of the default attribute file, if configured
    pub fn attributes_path(&self, root: &Path) -> Option<PathBuf> {
        self.attributes.as_ref().map(|p| root.join(p))
    }

    /// Get absolute target path relative to a project root
    pub fn target_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.target_path)
    }

    /// Alias rewriter honoring `extra_keywords`
    pub fn alias_rewriter(&self) -> AliasRewriter {
        AliasRewriter::with_keywords(&self.extra_keywords)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
