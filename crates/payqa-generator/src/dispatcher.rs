//! Batch dispatch of prompts to a generative backend
//!
//! Records are split into contiguous batches. A bulk-capable backend receives
//! each batch in one call; a single-prompt backend gets one call per record,
//! run concurrently under a semaphore. Every record yields exactly one
//! [`PredictionRecord`]: a failed, timed-out, or unparseable call degrades to
//! an empty answer list instead of aborting the run.

use crate::audit::{AuditLog, CallStatus};
use crate::config::GenerationConfig;
use crate::error::{GeneratorError, Result};
use crate::normalize::to_qa_pairs;
use crate::parser::extract;
use crate::prompt::{questions_for, PromptBuilder};
use crate::writer::PredictionSink;
use payqa_domain::{ControlSet, Exemplar, PredictionRecord, Record};
use payqa_llm::{Backend, BulkGenerator, LlmError, TextGenerator};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Counters for one dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Records processed (and predictions emitted)
    pub records: usize,
    /// Batches dispatched
    pub batches: usize,
    /// Batches served by a single bulk call
    pub bulk_batches: usize,
    /// Batches fanned out as parallel single-prompt calls
    pub fallback_batches: usize,
    /// Single-prompt calls that returned an error
    pub failed_calls: usize,
    /// Single-prompt calls that exceeded the per-call timeout
    pub timed_out_calls: usize,
    /// Question/answer pairs recovered across all records
    pub answered_pairs: usize,
}

impl DispatchStats {
    /// Records whose call failed or timed out
    pub fn degraded_records(&self) -> usize {
        self.failed_calls + self.timed_out_calls
    }
}

/// A record ready to send
struct Prepared<'a> {
    record: &'a Record,
    questions: &'a [String],
    prompt: String,
}

/// Raw reply for one prompt, empty when the call did not succeed
#[derive(Debug)]
struct Reply {
    text: String,
    status: CallStatus,
}

impl Reply {
    fn ok(text: String) -> Self {
        Self {
            text,
            status: CallStatus::Ok,
        }
    }

    fn empty(status: CallStatus) -> Self {
        Self {
            text: String::new(),
            status,
        }
    }
}

/// Drives prompts through a [`Backend`]
///
/// # Example
///
/// ```no_run
/// use payqa_generator::{Dispatcher, GenerationConfig};
/// use payqa_llm::{Backend, MockBackend};
///
/// # async fn run(records: Vec<payqa_domain::Record>) -> payqa_generator::Result<()> {
/// let dispatcher = Dispatcher::new(Backend::single(MockBackend::new("[]")), GenerationConfig::default());
/// let questions = vec!["Was the payment approved?".to_string()];
/// let predictions = dispatcher
///     .dispatch(&records, &questions, &Default::default(), &[])
///     .await?;
/// assert_eq!(predictions.len(), records.len());
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    backend: Backend,
    config: GenerationConfig,
    audit: Option<AuditLog>,
}

impl Dispatcher {
    /// Create a dispatcher for `backend`
    pub fn new(backend: Backend, config: GenerationConfig) -> Self {
        Self {
            backend,
            config,
            audit: None,
        }
    }

    /// Record one audit entry per processed record
    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The attached audit log, if any
    pub fn audit_log(&self) -> Option<&AuditLog> {
        self.audit.as_ref()
    }

    /// Release the audit log so it can be flushed
    pub fn into_audit_log(self) -> Option<AuditLog> {
        self.audit
    }

    /// Dispatch every record and collect the predictions
    ///
    /// The result holds exactly one prediction per record. Predictions from one
    /// batch keep the batch's record order.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::MissingField`] if a record has no questions to pose
    /// - [`GeneratorError::BackendTransport`] if a bulk call fails
    pub async fn dispatch(
        &self,
        records: &[Record],
        questions: &[String],
        controls: &ControlSet,
        exemplars: &[Exemplar],
    ) -> Result<Vec<PredictionRecord>> {
        let sink: Mutex<Vec<PredictionRecord>> = Mutex::new(Vec::with_capacity(records.len()));
        self.dispatch_into(records, questions, controls, exemplars, &sink)
            .await?;
        Ok(sink.into_inner().unwrap_or_else(|e| e.into_inner()))
    }

    /// Dispatch every record, handing each batch's predictions to `sink` as
    /// soon as the batch completes
    ///
    /// All prompts are rendered before the first backend call, so a record
    /// without questions aborts the run before anything is written.
    pub async fn dispatch_into(
        &self,
        records: &[Record],
        questions: &[String],
        controls: &ControlSet,
        exemplars: &[Exemplar],
        sink: &dyn PredictionSink,
    ) -> Result<DispatchStats> {
        let builder = PromptBuilder::new(controls, exemplars);
        let mut prepared = Vec::with_capacity(records.len());
        for record in records {
            let questions = questions_for(record, questions)?;
            prepared.push(Prepared {
                record,
                questions,
                prompt: builder.build(record, questions),
            });
        }

        let batch_size = self.config.effective_batch_size(prepared.len());
        let mut stats = DispatchStats::default();
        let started = Instant::now();

        info!(
            "Dispatching {} records in batches of {} to {} ({})",
            prepared.len(),
            batch_size,
            self.backend.model_name(),
            if self.backend.is_bulk_capable() { "bulk" } else { "parallel" }
        );

        for (batch_no, batch) in prepared.chunks(batch_size).enumerate() {
            let prompts: Vec<String> = batch.iter().map(|p| p.prompt.clone()).collect();
            debug!("Batch {}: {} prompts", batch_no + 1, prompts.len());

            let replies = match &self.backend {
                Backend::BulkCapable(generator) => {
                    stats.bulk_batches += 1;
                    self.call_bulk(generator, &prompts).await?
                }
                Backend::SingleOnly(generator) => {
                    stats.fallback_batches += 1;
                    self.fan_out(generator, prompts).await
                }
            };
            stats.batches += 1;

            for (item, reply) in batch.iter().zip(replies) {
                match reply.status {
                    CallStatus::Ok => {}
                    CallStatus::Failed => stats.failed_calls += 1,
                    CallStatus::TimedOut => stats.timed_out_calls += 1,
                }

                let answers = to_qa_pairs(&extract(&reply.text), item.questions);
                if answers.is_empty() && reply.status == CallStatus::Ok {
                    warn!("No answers recovered for record {}", item.record.id());
                }
                stats.answered_pairs += answers.len();

                if let Some(audit) = &self.audit {
                    audit.record(
                        item.record.id(),
                        &item.prompt,
                        &reply.text,
                        reply.status,
                        &answers,
                    )?;
                }

                sink.write(&PredictionRecord::new(item.record.id(), answers))?;
                stats.records += 1;
            }
        }

        info!(
            "Dispatched {} records in {} batches ({} failed, {} timed out, {} answers) in {:?}",
            stats.records,
            stats.batches,
            stats.failed_calls,
            stats.timed_out_calls,
            stats.answered_pairs,
            started.elapsed()
        );

        Ok(stats)
    }

    /// One bulk call for the whole batch; any failure is fatal
    async fn call_bulk(
        &self,
        generator: &Arc<dyn BulkGenerator>,
        prompts: &[String],
    ) -> Result<Vec<Reply>> {
        let outcome =
            tokio::time::timeout(self.config.call_timeout(), generator.generate_bulk(prompts))
                .await
                .unwrap_or(Err(LlmError::Timeout));

        let texts = outcome.map_err(|e| {
            error!("Bulk call for {} prompts failed: {}", prompts.len(), e);
            GeneratorError::BackendTransport(e.to_string())
        })?;

        if texts.len() != prompts.len() {
            error!(
                "Bulk call returned {} replies for {} prompts",
                texts.len(),
                prompts.len()
            );
            return Err(GeneratorError::BackendTransport(format!(
                "bulk call returned {} replies for {} prompts",
                texts.len(),
                prompts.len()
            )));
        }

        Ok(texts.into_iter().map(Reply::ok).collect())
    }

    /// One call per prompt, bounded by a semaphore
    ///
    /// Results are placed by the index captured at spawn time. Every task is
    /// joined before returning; a task that fails or times out leaves an empty
    /// reply and does not affect its siblings.
    async fn fan_out(
        &self,
        generator: &Arc<dyn TextGenerator>,
        prompts: Vec<String>,
    ) -> Vec<Reply> {
        let len = prompts.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_for(len)));
        let timeout = self.config.call_timeout();

        let mut join_set = JoinSet::new();
        for (idx, prompt) in prompts.into_iter().enumerate() {
            let generator = Arc::clone(generator);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = tokio::time::timeout(timeout, generator.generate(&prompt)).await;
                (idx, outcome)
            });
        }

        let mut replies: Vec<Option<Reply>> = (0..len).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Ok(Ok(text)))) => {
                    debug!("Prompt {} answered ({} chars)", idx, text.len());
                    replies[idx] = Some(Reply::ok(text));
                }
                Ok((idx, Ok(Err(e)))) => {
                    warn!("Call for prompt {} failed: {}", idx, e);
                    replies[idx] = Some(Reply::empty(CallStatus::Failed));
                }
                Ok((idx, Err(_))) => {
                    warn!("Call for prompt {} timed out after {:?}", idx, timeout);
                    replies[idx] = Some(Reply::empty(CallStatus::TimedOut));
                }
                Err(e) => error!("Backend task aborted: {}", e),
            }
        }

        replies
            .into_iter()
            .map(|reply| reply.unwrap_or_else(|| Reply::empty(CallStatus::Failed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payqa_domain::{Answer, QaPair};
    use payqa_llm::{MockBackend, MockReply};
    use serde_json::json;
    use std::time::Duration;

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Record::from_value(i, json!({"record_id": id, "amount": i})).unwrap())
            .collect()
    }

    fn questions() -> Vec<String> {
        vec!["Q1".to_string(), "Q2".to_string()]
    }

    fn config(batch_size: usize) -> GenerationConfig {
        GenerationConfig {
            batch_size: Some(batch_size),
            ..Default::default()
        }
    }

    const BOTH_ANSWERED: &str = r#"[{"question":"Q1","answer":"Yes"},{"question":"Q2","answer":"No"}]"#;

    #[tokio::test]
    async fn test_bulk_path_uses_one_call_per_batch() {
        let backend = MockBackend::new(BOTH_ANSWERED);
        let dispatcher = Dispatcher::new(Backend::bulk(backend.clone()), config(2));

        let sink: Mutex<Vec<PredictionRecord>> = Mutex::new(Vec::new());
        let stats = dispatcher
            .dispatch_into(&records(&["A", "B", "C"]), &questions(), &ControlSet::new(), &[], &sink)
            .await
            .unwrap();

        assert_eq!(backend.bulk_call_count(), 2);
        assert_eq!(backend.call_count(), 0);
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.bulk_batches, 2);
        assert_eq!(stats.answered_pairs, 6);

        let predictions = sink.into_inner().unwrap();
        let ids: Vec<&str> = predictions.iter().map(|p| p.record_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(
            predictions[0].answers,
            vec![QaPair::new("Q1", Answer::Yes), QaPair::new("Q2", Answer::No)]
        );
    }

    #[tokio::test]
    async fn test_bulk_failure_is_fatal() {
        let mut backend = MockBackend::new(BOTH_ANSWERED);
        backend.fail_bulk("connection refused");
        let dispatcher = Dispatcher::new(Backend::bulk(backend), config(2));

        let err = dispatcher
            .dispatch(&records(&["A", "B"]), &questions(), &ControlSet::new(), &[])
            .await
            .unwrap_err();
        match err {
            GeneratorError::BackendTransport(message) => {
                assert!(message.contains("connection refused"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bulk_error_reply_is_fatal() {
        let mut backend = MockBackend::new(BOTH_ANSWERED);
        backend.add_error_rule("\"B\"");
        let dispatcher = Dispatcher::new(Backend::bulk(backend), config(3));

        let result = dispatcher
            .dispatch(&records(&["A", "B", "C"]), &questions(), &ControlSet::new(), &[])
            .await;
        assert!(matches!(result, Err(GeneratorError::BackendTransport(_))));
    }

    struct ShortBulk;

    #[async_trait::async_trait]
    impl BulkGenerator for ShortBulk {
        async fn generate_bulk(
            &self,
            prompts: &[String],
        ) -> std::result::Result<Vec<String>, LlmError> {
            Ok(vec![String::new(); prompts.len().saturating_sub(1)])
        }
    }

    #[tokio::test]
    async fn test_bulk_reply_count_mismatch_is_fatal() {
        let dispatcher = Dispatcher::new(Backend::bulk(ShortBulk), config(2));
        let err = dispatcher
            .dispatch(&records(&["A", "B"]), &questions(), &ControlSet::new(), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 replies for 2 prompts"));
    }

    #[tokio::test]
    async fn test_fallback_pairs_replies_by_index() {
        let mut backend = MockBackend::new("[]");
        backend.add_scripted_rule(
            "\"record_id\": \"A\"",
            MockReply::Delayed {
                delay: Duration::from_millis(50),
                text: r#"[{"question":"Q1","answer":"No"}]"#.to_string(),
            },
        );
        backend.add_rule("\"record_id\": \"B\"", r#"[{"question":"Q1","answer":"Yes"}]"#);

        let dispatcher = Dispatcher::new(Backend::single(backend.clone()), config(2));
        let predictions = dispatcher
            .dispatch(&records(&["A", "B"]), &questions(), &ControlSet::new(), &[])
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(predictions[0].record_id, "A");
        assert_eq!(predictions[0].answers, vec![QaPair::new("Q1", Answer::No)]);
        assert_eq!(predictions[1].answers, vec![QaPair::new("Q1", Answer::Yes)]);
    }

    #[tokio::test]
    async fn test_failed_call_degrades_only_its_record() {
        let mut backend = MockBackend::new(BOTH_ANSWERED);
        backend.add_error_rule("\"record_id\": \"B\"");

        let dispatcher = Dispatcher::new(Backend::single(backend), config(3));
        let sink: Mutex<Vec<PredictionRecord>> = Mutex::new(Vec::new());
        let stats = dispatcher
            .dispatch_into(&records(&["A", "B", "C"]), &questions(), &ControlSet::new(), &[], &sink)
            .await
            .unwrap();

        let predictions = sink.into_inner().unwrap();
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].answers.len(), 2);
        assert!(predictions[1].answers.is_empty());
        assert_eq!(predictions[2].answers.len(), 2);
        assert_eq!(stats.failed_calls, 1);
        assert_eq!(stats.degraded_records(), 1);
    }

    #[tokio::test]
    async fn test_timeout_degrades_record() {
        let mut backend = MockBackend::new(BOTH_ANSWERED);
        backend.add_scripted_rule(
            "\"record_id\": \"SLOW\"",
            MockReply::Delayed {
                delay: Duration::from_secs(30),
                text: BOTH_ANSWERED.to_string(),
            },
        );

        let config = GenerationConfig {
            batch_size: Some(2),
            call_timeout_secs: 1,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(Backend::single(backend), config);
        let sink: Mutex<Vec<PredictionRecord>> = Mutex::new(Vec::new());
        let stats = dispatcher
            .dispatch_into(
                &records(&["SLOW", "FAST"]),
                &questions(),
                &ControlSet::new(),
                &[],
                &sink,
            )
            .await
            .unwrap();

        let predictions = sink.into_inner().unwrap();
        assert!(predictions[0].answers.is_empty());
        assert_eq!(predictions[1].answers.len(), 2);
        assert_eq!(stats.timed_out_calls, 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting {
            in_flight: AtomicUsize,
            peak: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl TextGenerator for Counting {
            async fn generate(&self, _prompt: &str) -> std::result::Result<String, LlmError> {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok("[]".to_string())
            }
        }

        let generator = Arc::new(Counting {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let backend = Backend::SingleOnly(generator.clone());
        let config = GenerationConfig {
            batch_size: Some(8),
            max_concurrency: Some(3),
            ..Default::default()
        };

        let ids: Vec<String> = (0..8).map(|i| format!("R{}", i)).collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        let predictions = Dispatcher::new(backend, config)
            .dispatch(&records(&ids), &questions(), &ControlSet::new(), &[])
            .await
            .unwrap();

        assert_eq!(predictions.len(), 8);
        assert!(generator.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_missing_questions_abort_before_any_call() {
        let backend = MockBackend::new(BOTH_ANSWERED);
        let dispatcher = Dispatcher::new(Backend::single(backend.clone()), config(2));

        let err = dispatcher
            .dispatch(&records(&["A", "B"]), &[], &ControlSet::new(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::MissingField { .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let dispatcher = Dispatcher::new(
            Backend::single(MockBackend::default()),
            GenerationConfig::default(),
        );
        let sink: Mutex<Vec<PredictionRecord>> = Mutex::new(Vec::new());
        let stats = dispatcher
            .dispatch_into(&[], &questions(), &ControlSet::new(), &[], &sink)
            .await
            .unwrap();
        assert_eq!(stats, DispatchStats::default());
        assert!(sink.into_inner().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_entries_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let mut backend = MockBackend::new(BOTH_ANSWERED);
        backend.add_error_rule("\"record_id\": \"B\"");
        let dispatcher = Dispatcher::new(Backend::single(backend), config(2))
            .with_audit_log(AuditLog::create(&path).unwrap());

        dispatcher
            .dispatch(&records(&["A", "B"]), &questions(), &ControlSet::new(), &[])
            .await
            .unwrap();
        assert_eq!(dispatcher.audit_log().unwrap().entries_written(), 2);
        dispatcher.into_audit_log().unwrap().finish().unwrap();

        let entries: Vec<crate::audit::AuditEntry> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(entries[0].record_id, "A");
        assert_eq!(entries[0].status, CallStatus::Ok);
        assert_eq!(entries[1].status, CallStatus::Failed);
        assert_eq!(entries[1].raw_reply_chars, 0);
    }
}
