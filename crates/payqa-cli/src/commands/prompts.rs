//! Prompts command implementation.

use super::ensure_parent;
use crate::cli::PromptsArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use payqa_generator::{export_prompts, load_exemplars, load_records, JsonlWriter};

/// Execute the prompts command.
pub fn execute_prompts(args: PromptsArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let input = args.input.unwrap_or_else(|| config.input_path());
    let output = args.output.unwrap_or_else(|| config.prompts_path());

    let records = load_records(&input)?;
    let exemplars = load_exemplars(&config.generator.few_shot, Some(config.data_dir().as_path()));

    ensure_parent(&output)?;
    let writer = JsonlWriter::create(&output)?;
    let stats = export_prompts(
        &records,
        &config.generator.questions,
        &config.generator.controls,
        &exemplars,
        &writer,
    )?;
    writer.finish()?;

    println!("{}", formatter.export_summary(&stats, &output)?);
    Ok(())
}
