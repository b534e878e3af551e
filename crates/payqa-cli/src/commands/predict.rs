//! Predict command implementation.

use super::ensure_parent;
use crate::backend::build_backend;
use crate::cli::PredictArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use payqa_generator::{load_exemplars, load_records, AuditLog, Dispatcher, PredictionWriter};
use std::fs;
use tracing::{error, info, warn};

/// Execute the predict command.
///
/// The predictions file is truncated at the start of the run. If the run
/// aborts, the partial file is removed.
pub async fn execute_predict(
    args: PredictArgs,
    config: &AppConfig,
    formatter: &Formatter,
) -> Result<()> {
    let input = args.input.unwrap_or_else(|| config.input_path());
    let output = args.output.unwrap_or_else(|| config.predictions_path());

    let mut generation = config.generator.generation.clone();
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 {
            return Err(CliError::InvalidInput("Batch size must be at least 1".to_string()));
        }
        generation.batch_size = Some(batch_size);
    }

    let records = load_records(&input)?;
    let exemplars = load_exemplars(&config.generator.few_shot, Some(config.data_dir().as_path()));
    let backend = build_backend(&config.model)?;

    let mut dispatcher = Dispatcher::new(backend, generation);
    if let Some(audit_path) = config.audit_path() {
        ensure_parent(&audit_path)?;
        let audit = AuditLog::open(&audit_path)?;
        info!("Audit run {} -> {}", audit.run_id(), audit_path.display());
        dispatcher = dispatcher.with_audit_log(audit);
    }

    ensure_parent(&output)?;
    let writer = PredictionWriter::create(&output)?;

    let result = dispatcher
        .dispatch_into(
            &records,
            &config.generator.questions,
            &config.generator.controls,
            &exemplars,
            &writer,
        )
        .await;

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            error!("Run aborted: {}", e);
            drop(writer);
            if let Err(rm) = fs::remove_file(&output) {
                warn!("Could not remove partial output {}: {}", output.display(), rm);
            }
            return Err(e.into());
        }
    };

    writer.finish()?;
    if let Some(audit) = dispatcher.into_audit_log() {
        audit.finish()?;
    }

    println!("{}", formatter.predict_summary(&stats, &output)?);
    Ok(())
}
