//! Attributes command implementation

use anyhow::{Context, Result};

use crate::cli::{AttributesArgs, GlobalArgs, OutputFormat};
use crate::commands::common::Project;

/// Execute the attributes command
pub fn execute(args: &AttributesArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global)?;
    let attributes = project.load_attributes(args.attributes.as_deref())?;

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&attributes)
                .context("Failed to serialize attributes")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for (table, attrs) in attributes.iter() {
                println!("{table}");
                for attr in attrs {
                    let pk = if attr.is_pk { " [pk]" } else { "" };
                    println!("  {}{pk} = {}", attr.name, attr.formula);
                }
            }
            println!("\n{} tables", attributes.len());
        }
    }

    Ok(())
}
