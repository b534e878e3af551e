//! Per-record audit trail
//!
//! Each processed record gets one JSONL entry tying the prompt (by digest and
//! excerpt) to the reply size, the call outcome, and the normalized answers.

use crate::error::Result;
use crate::writer::JsonlWriter;
use payqa_domain::QaPair;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Characters of the prompt kept in an audit entry
pub const EXCERPT_CHARS: usize = 300;

/// Outcome of the backend call for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// A reply was received
    Ok,
    /// The call returned an error
    Failed,
    /// The call did not complete within the per-call timeout
    TimedOut,
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Run this entry belongs to (UUIDv7)
    pub run_id: String,
    /// Unix seconds
    pub timestamp: u64,
    /// Record the prompt was built for
    pub record_id: String,
    /// Hex SHA-256 of the full prompt
    pub prompt_sha256: String,
    /// Leading part of the prompt
    pub prompt_excerpt: String,
    /// Length of the raw reply in characters
    pub raw_reply_chars: usize,
    /// Call outcome
    pub status: CallStatus,
    /// Normalized answers emitted for the record
    pub answers: Vec<QaPair>,
}

/// Append-only audit log scoped to one run
pub struct AuditLog {
    run_id: Uuid,
    writer: JsonlWriter<Box<dyn Write + Send>>,
}

impl AuditLog {
    /// Open `path` for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Create (or truncate) `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }

    /// Log to an arbitrary stream under a fresh run id
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            writer: JsonlWriter::new(Box::new(writer)),
        }
    }

    /// Identifier shared by every entry of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Build and append the entry for one record
    pub fn record(
        &self,
        record_id: &str,
        prompt: &str,
        raw_reply: &str,
        status: CallStatus,
        answers: &[QaPair],
    ) -> Result<()> {
        let entry = AuditEntry {
            run_id: self.run_id.to_string(),
            timestamp: unix_now(),
            record_id: record_id.to_string(),
            prompt_sha256: prompt_digest(prompt),
            prompt_excerpt: excerpt(prompt),
            raw_reply_chars: raw_reply.chars().count(),
            status,
            answers: answers.to_vec(),
        };
        self.writer.write_line(&entry)
    }

    /// Entries written so far
    pub fn entries_written(&self) -> usize {
        self.writer.lines_written()
    }

    /// Flush buffered entries
    pub fn finish(self) -> Result<()> {
        self.writer.finish()?;
        Ok(())
    }
}

/// Hex SHA-256 of a prompt
pub fn prompt_digest(prompt: &str) -> String {
    format!("{:x}", Sha256::digest(prompt.as_bytes()))
}

/// First [`EXCERPT_CHARS`] characters, with `...` when truncated
pub fn excerpt(prompt: &str) -> String {
    match prompt.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &prompt[..cut]),
        None => prompt.to_string(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use payqa_domain::Answer;

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short"), "short");

        let exact = "x".repeat(EXCERPT_CHARS);
        assert_eq!(excerpt(&exact), exact);

        let long = "é".repeat(EXCERPT_CHARS + 5);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 3);
    }

    #[test]
    fn test_prompt_digest() {
        assert_eq!(
            prompt_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(prompt_digest("a"), prompt_digest("a"));
        assert_ne!(prompt_digest("a"), prompt_digest("b"));
    }

    #[test]
    fn test_entries_share_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let log = AuditLog::create(&path).unwrap();
        let run_id = log.run_id().to_string();
        log.record(
            "A",
            "prompt A",
            "[{\"question\":\"Q1\",\"answer\":\"Yes\"}]",
            CallStatus::Ok,
            &[QaPair::new("Q1", Answer::Yes)],
        )
        .unwrap();
        log.record("B", "prompt B", "", CallStatus::TimedOut, &[]).unwrap();
        assert_eq!(log.entries_written(), 2);
        log.finish().unwrap();

        let entries: Vec<AuditEntry> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.run_id == run_id));
        assert_eq!(entries[0].raw_reply_chars, 34);
        assert_eq!(entries[0].answers, vec![QaPair::new("Q1", Answer::Yes)]);
        assert_eq!(entries[1].status, CallStatus::TimedOut);
        assert_eq!(entries[1].prompt_sha256, prompt_digest("prompt B"));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&CallStatus::TimedOut).unwrap(), "\"timed_out\"");
        assert_eq!(serde_json::to_string(&CallStatus::Ok).unwrap(), "\"ok\"");
    }
}
