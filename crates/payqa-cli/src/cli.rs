//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// payqa - Evaluate payment records against control questions with an LLM.
#[derive(Debug, Parser)]
#[command(name = "payqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PAYQA_CONFIG", default_value = "payqa.toml")]
    pub config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (output path only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate predictions for every input record
    Predict(PredictArgs),

    /// Render prompts to a JSONL file without calling the model
    Prompts(PromptsArgs),

    /// Pivot predictions into a CSV report
    Report(ReportArgs),
}

/// Arguments for the predict command.
#[derive(Debug, Parser)]
pub struct PredictArgs {
    /// Input records (JSON array); overrides paths.input_file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Predictions output (JSONL); overrides paths.predictions_file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Records per batch; overrides generation.batch_size
    #[arg(short, long)]
    pub batch_size: Option<usize>,
}

/// Arguments for the prompts command.
#[derive(Debug, Parser)]
pub struct PromptsArgs {
    /// Input records (JSON array); overrides paths.input_file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Prompts output (JSONL); overrides paths.prompts_file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the report command.
#[derive(Debug, Parser)]
pub struct ReportArgs {
    /// Input records (JSON array); overrides paths.input_file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Predictions (JSONL); overrides paths.predictions_file
    #[arg(short, long)]
    pub predictions: Option<PathBuf>,

    /// Report output (CSV); overrides paths.report_file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
