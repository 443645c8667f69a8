//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// CellQL - compile algorithm notation to SQL
#[derive(Parser, Debug)]
#[command(name = "cq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile algorithm files to SQL
    Compile(CompileArgs),

    /// Print the RPN sequence of each part of an algorithm
    Explain(ExplainArgs),

    /// Print the expanded table to attribute map
    Attributes(AttributesArgs),

    /// List registered transforms
    Transforms(TransformsArgs),
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON output
    Json,
}

/// Arguments for the compile command
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Algorithm files to compile
    #[arg(required = true)]
    pub algorithms: Vec<String>,

    /// Attribute file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    pub attributes: Option<String>,

    /// Combine all parts into one statement with FULL JOIN
    #[arg(short, long)]
    pub join_parts: bool,

    /// Override output directory
    #[arg(short = 'd', long)]
    pub output_dir: Option<String>,

    /// Print SQL to stdout instead of writing files
    #[arg(long)]
    pub stdout: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the explain command
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Algorithm file to explain
    pub algorithm: String,

    /// Attribute file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    pub attributes: Option<String>,

    /// Combine all parts into one sequence with FULL JOIN
    #[arg(short, long)]
    pub join_parts: bool,
}

/// Arguments for the attributes command
#[derive(Args, Debug)]
pub struct AttributesArgs {
    /// Attribute file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    pub attributes: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the transforms command
#[derive(Args, Debug)]
pub struct TransformsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
