//! Compile command implementation

use anyhow::{Context, Result};
use cq_compiler::prepare_with_attributes;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::{CompileArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{algorithm_stem, read_algorithm, Project};

/// Compiled statements of one algorithm file
#[derive(Debug, Serialize)]
struct CompiledAlgorithm {
    algorithm: String,
    statements: Vec<String>,
}

/// Execute the compile command
pub fn execute(args: &CompileArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global)?;
    let attributes = project.load_attributes(args.attributes.as_deref())?;
    let registry = project.registry()?;
    let options = project.options(args.join_parts);

    let mut compiled = Vec::with_capacity(args.algorithms.len());
    for path in &args.algorithms {
        let text = read_algorithm(path)?;
        let prepared = prepare_with_attributes(&attributes, &text, &registry, &options)
            .with_context(|| format!("Failed to compile algorithm: {path}"))?;
        compiled.push(CompiledAlgorithm {
            algorithm: path.clone(),
            statements: prepared.into_statements(),
        });
    }

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&compiled)
                .context("Failed to serialize compiled SQL")?;
            println!("{json}");
        }
        OutputFormat::Text if args.stdout => {
            for algorithm in &compiled {
                for sql in &algorithm.statements {
                    println!("{sql};\n");
                }
            }
        }
        OutputFormat::Text => {
            let output_dir = args
                .output_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| project.config.target_path_absolute(&project.root));
            std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

            for algorithm in &compiled {
                for (path, sql) in output_files(&output_dir, algorithm) {
                    std::fs::write(&path, format!("{sql}\n"))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("  ✓ {}", path.display());
                }
            }
            println!("\nCompiled {} algorithm(s)", compiled.len());
        }
    }

    Ok(())
}

/// `<stem>.sql` for a single statement, `<stem>_partN.sql` otherwise
fn output_files<'a>(dir: &Path, algorithm: &'a CompiledAlgorithm) -> Vec<(PathBuf, &'a str)> {
    let stem = algorithm_stem(&algorithm.algorithm);
    match algorithm.statements.as_slice() {
        [single] => vec![(dir.join(format!("{stem}.sql")), single.as_str())],
        parts => parts
            .iter()
            .enumerate()
            .map(|(i, sql)| (dir.join(format!("{stem}_part{}.sql", i + 1)), sql.as_str()))
            .collect(),
    }
}

