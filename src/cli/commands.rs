//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Maximum number of jobs running at once (overrides the pipeline file)
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Only run matrix cells where axis=value (repeatable)
    #[arg(long, value_parser = parse_key_value)]
    pub only: Vec<(String, String)>,

    /// Report what each step would run instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Timeout for each shell step, in seconds
    #[arg(long, default_value_t = 3600)]
    pub timeout: u64,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the JSON result to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List the expanded job instances
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Only list matrix cells where axis=value (repeatable)
    #[arg(long, value_parser = parse_key_value)]
    pub only: Vec<(String, String)>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
