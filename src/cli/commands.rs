//! CLI command definitions

use clap::Args;

const DEFAULT_PIPELINE_FILE: &str = "stepline.yml";

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = DEFAULT_PIPELINE_FILE)]
    pub file: String,

    /// Event kind that triggered the run
    #[arg(short, long, env = "STEPLINE_EVENT", default_value = "push")]
    pub event: String,

    /// Target branch of the event
    #[arg(short, long, env = "STEPLINE_BRANCH")]
    pub branch: Option<String>,

    /// Directory steps run in
    #[arg(short = 'C', long, default_value = ".")]
    pub workdir: String,

    /// Variable overrides (KEY=VALUE)
    #[arg(long, value_parser = parse_key_value)]
    pub var: Vec<(String, String)>,

    /// Prefix prepended to secret names when reading them from the environment
    #[arg(long, env = "STEPLINE_SECRET_PREFIX")]
    pub secret_prefix: Option<String>,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,

    /// Print the run result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = DEFAULT_PIPELINE_FILE)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Evaluate an event against a pipeline's trigger rule
#[derive(Debug, Args, Clone)]
pub struct TriggerCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = DEFAULT_PIPELINE_FILE)]
    pub file: String,

    /// Event kind to evaluate
    #[arg(short, long, env = "STEPLINE_EVENT")]
    pub event: String,
}

/// Print a pipeline in canonical form
#[derive(Debug, Args, Clone)]
pub struct FmtCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = DEFAULT_PIPELINE_FILE)]
    pub file: String,
}

/// List pipelines in history
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show run counts
    #[arg(long)]
    pub with_counts: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Pipeline name to filter by
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show per-step outcomes
    #[arg(long)]
    pub steps: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a single run by execution ID
    #[arg(long)]
    pub execution_id: Option<String>,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
