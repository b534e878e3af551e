//! payqa CLI - Command-line interface for LLM-assisted payment control QA.

use clap::Parser;
use payqa_cli::commands;
use payqa_cli::{AppConfig, Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> payqa_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = AppConfig::load(&cli.config)?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Predict(args) => {
            commands::execute_predict(args, &config, &formatter).await?;
        }
        Command::Prompts(args) => {
            commands::execute_prompts(args, &config, &formatter)?;
        }
        Command::Report(args) => {
            commands::execute_report(args, &config, &formatter)?;
        }
    }

    Ok(())
}

/// Log to stderr; RUST_LOG wins over the -v count
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
