//! Report command implementation.

use super::ensure_parent;
use crate::cli::ReportArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use payqa_generator::{load_predictions, load_records, Report};
use std::fs::File;
use std::io::BufWriter;

/// Execute the report command.
pub fn execute_report(args: ReportArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let input = args.input.unwrap_or_else(|| config.input_path());
    let predictions_path = args.predictions.unwrap_or_else(|| config.predictions_path());
    let output = args.output.unwrap_or_else(|| config.report_path());

    let records = load_records(&input)?;
    let predictions = load_predictions(&predictions_path)?;
    let report = Report::build(&records, &predictions, &config.report.metadata_fields);

    ensure_parent(&output)?;
    report.write_csv(BufWriter::new(File::create(&output)?))?;

    println!(
        "{}",
        formatter.report_summary(report.rows.len(), report.columns.len(), &output)?
    );
    Ok(())
}
