//! Line-delimited JSON output

use crate::error::Result;
use payqa_domain::PredictionRecord;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Destination for finished predictions
///
/// Called from concurrent producers; implementations serialize their writes.
pub trait PredictionSink: Send + Sync {
    /// Accept one prediction
    fn write(&self, prediction: &PredictionRecord) -> Result<()>;
}

/// Append-only JSONL writer shared between producers
///
/// Each value is serialized before the lock is taken and then written as one
/// complete line, so concurrent writers never interleave partial lines. The
/// underlying stream is flushed by [`JsonlWriter::finish`] or when the writer
/// is dropped.
pub struct JsonlWriter<W: Write + Send> {
    inner: Mutex<Inner<W>>,
}

struct Inner<W> {
    writer: W,
    lines: usize,
}

/// JSONL writer over a buffered file
pub type PredictionWriter = JsonlWriter<BufWriter<File>>;

impl JsonlWriter<BufWriter<File>> {
    /// Create (or truncate) a file for this run
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Open a file for appending, creating it if needed
    pub fn append_to(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonlWriter<W> {
    /// Wrap an arbitrary stream
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(Inner { writer, lines: 0 }),
        }
    }

    /// Serialize `value` and append it as one line
    pub fn write_line<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.writer.write_all(&line)?;
        inner.lines += 1;
        Ok(())
    }

    /// Number of lines written so far
    pub fn lines_written(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).lines
    }

    /// Flush and return the underlying stream
    pub fn finish(self) -> Result<W> {
        let mut inner = self.inner.into_inner().unwrap_or_else(|e| e.into_inner());
        inner.writer.flush()?;
        Ok(inner.writer)
    }
}

impl<W: Write + Send> PredictionSink for JsonlWriter<W> {
    fn write(&self, prediction: &PredictionRecord) -> Result<()> {
        self.write_line(prediction)
    }
}

impl PredictionSink for Mutex<Vec<PredictionRecord>> {
    fn write(&self, prediction: &PredictionRecord) -> Result<()> {
        self.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prediction.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payqa_domain::{Answer, QaPair};
    use std::sync::Arc;

    #[test]
    fn test_one_line_per_prediction() {
        let writer = JsonlWriter::new(Vec::new());
        writer
            .write(&PredictionRecord::new("A", vec![QaPair::new("Q1", Answer::Yes)]))
            .unwrap();
        writer.write(&PredictionRecord::empty("B")).unwrap();
        assert_eq!(writer.lines_written(), 2);

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"record_id":"A","answers":[{"question":"Q1","answer":"Yes"}]}"#,
                r#"{"record_id":"B","answers":[]}"#,
            ]
        );
    }

    #[test]
    fn test_concurrent_writers_do_not_interleave() {
        let writer = Arc::new(JsonlWriter::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = Arc::clone(&writer);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let question = format!("question {} {}", t, i);
                        let answers = vec![QaPair::new(question, Answer::No); 5];
                        writer
                            .write(&PredictionRecord::new(format!("{}-{}", t, i), answers))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let writer = Arc::try_unwrap(writer).ok().unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        let parsed: Vec<PredictionRecord> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed.len(), 400);
    }

    #[test]
    fn test_create_truncates_and_append_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.jsonl");

        let writer = PredictionWriter::create(&path).unwrap();
        writer.write(&PredictionRecord::empty("A")).unwrap();
        writer.finish().unwrap();

        let writer = PredictionWriter::append_to(&path).unwrap();
        writer.write(&PredictionRecord::empty("B")).unwrap();
        drop(writer);

        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);

        let writer = PredictionWriter::create(&path).unwrap();
        writer.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_collecting_sink() {
        let sink: Mutex<Vec<PredictionRecord>> = Mutex::new(Vec::new());
        sink.write(&PredictionRecord::empty("A")).unwrap();
        assert_eq!(sink.into_inner().unwrap().len(), 1);
    }
}
