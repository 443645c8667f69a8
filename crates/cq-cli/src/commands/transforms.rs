//! Transforms command implementation

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{GlobalArgs, OutputFormat, TransformsArgs};
use crate::commands::common::Project;

#[derive(Debug, Serialize)]
struct TransformInfo<'a> {
    name: &'a str,
    description: String,
}

/// Execute the transforms command
pub fn execute(args: &TransformsArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global)?;
    let registry = project.registry()?;
    let transforms: Vec<TransformInfo<'_>> = registry
        .list()
        .into_iter()
        .map(|(name, description)| TransformInfo { name, description })
        .collect();

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&transforms)
                .context("Failed to serialize transforms")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            let width = transforms.iter().map(|t| t.name.len()).max().unwrap_or(0);
            for t in &transforms {
                println!("{:<width$}  {}", t.name, t.description);
            }
        }
    }

    Ok(())
}
