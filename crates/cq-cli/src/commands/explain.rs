//! Explain command implementation

use anyhow::{Context, Result};
use cq_compiler::{parse_parts, MergeMode};

use crate::cli::{ExplainArgs, GlobalArgs};
use crate::commands::common::{read_algorithm, Project};

/// Execute the explain command
pub fn execute(args: &ExplainArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global)?;
    let attributes = project.load_attributes(args.attributes.as_deref())?;
    let options = project.options(args.join_parts);
    let text = read_algorithm(&args.algorithm)?;

    for (i, part) in parse_parts(&text, &attributes, options.mode).enumerate() {
        let tokens =
            part.with_context(|| format!("Failed to parse algorithm: {}", args.algorithm))?;
        println!("Part {}:", i + 1);
        for token in &tokens {
            println!("  {token}");
        }
        println!();
        if options.mode == MergeMode::Merge {
            break;
        }
    }

    Ok(())
}
