//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use cq_compiler::{CompileOptions, MergeMode};
use cq_core::{expand_attributes, load_attribute_specs, AttributeMap, Config, CoreError};
use cq_transform::TransformRegistry;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Configuration and root directory shared by every command
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Load `cellql.yml` from `--config` or the project directory.
    ///
    /// A project without a config file runs on defaults; an explicit
    /// `--config` path must exist.
    pub(crate) fn load(global: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&global.project_dir);

        let config = match &global.config {
            Some(path) => Config::load(Path::new(path))
                .with_context(|| format!("Failed to load config: {path}"))?,
            None => match Config::load_from_dir(&root) {
                Ok(config) => config,
                Err(CoreError::ConfigNotFound { path }) => {
                    log::debug!("No config at {path}, using defaults");
                    Config::default()
                }
                Err(e) => return Err(e).context("Failed to load project config"),
            },
        };
        log::debug!("Loaded project '{}' from {}", config.name, root.display());

        Ok(Self { root, config })
    }

    /// Attribute file from the command line, else the configured default
    pub(crate) fn attributes_file(&self, arg: Option<&str>) -> Result<PathBuf> {
        match arg {
            Some(path) => Ok(PathBuf::from(path)),
            None => match self.config.attributes_path(&self.root) {
                Some(path) => Ok(path),
                None => bail!("No attribute file: pass --attributes or set 'attributes' in cellql.yml"),
            },
        }
    }

    /// Read and expand the attribute file
    pub(crate) fn load_attributes(&self, arg: Option<&str>) -> Result<AttributeMap> {
        let path = self.attributes_file(arg)?;
        let specs = load_attribute_specs(&path)
            .with_context(|| format!("Failed to read attributes: {}", path.display()))?;
        let map = expand_attributes(&specs)
            .with_context(|| format!("Failed to expand attributes: {}", path.display()))?;
        Ok(map)
    }

    /// Built-in transforms plus the lookup joins declared in config
    pub(crate) fn registry(&self) -> Result<TransformRegistry> {
        TransformRegistry::from_config(&self.config).context("Failed to register transforms")
    }

    /// Compile options, with `--join-parts` forcing merge mode
    pub(crate) fn options(&self, join_parts: bool) -> CompileOptions {
        let mut options = CompileOptions::from_config(&self.config);
        if join_parts {
            options.mode = MergeMode::Merge;
        }
        options
    }
}

/// Read an algorithm file
pub(crate) fn read_algorithm(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read algorithm: {path}"))
}

/// File stem used to name compiled output
pub(crate) fn algorithm_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("algorithm")
        .to_string()
}
