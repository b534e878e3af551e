//! Pivot predictions into a per-record CSV report

use crate::error::Result;
use payqa_domain::{PredictionRecord, Record};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Read a predictions JSONL file, skipping blank lines
pub fn load_predictions(path: impl AsRef<Path>) -> Result<Vec<PredictionRecord>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let predictions = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<PredictionRecord>)
        .collect::<std::result::Result<Vec<PredictionRecord>, _>>()?;

    info!("Loaded {} predictions from {}", predictions.len(), path.display());
    Ok(predictions)
}

/// Tabular report: one row per input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Metadata columns followed by question columns in sorted order
    pub columns: Vec<String>,
    /// Cell values, aligned with `columns`
    pub rows: Vec<Vec<String>>,
}

impl Report {
    /// Merge records with their predictions on `record_id` and pivot
    ///
    /// Records keep their input order. A record with no prediction gets empty
    /// question cells and a warning. When a prediction answers the same
    /// question twice the later answer wins.
    pub fn build(
        records: &[Record],
        predictions: &[PredictionRecord],
        metadata: &[String],
    ) -> Self {
        let by_id: HashMap<&str, &PredictionRecord> = predictions
            .iter()
            .map(|p| (p.record_id.as_str(), p))
            .collect();

        let mut question_columns = BTreeSet::new();
        let mut answer_maps = Vec::with_capacity(records.len());

        for record in records {
            let mut answers = HashMap::new();
            match by_id.get(record.id()) {
                Some(prediction) => {
                    for pair in &prediction.answers {
                        let question = pair.question.trim().to_string();
                        if !metadata.contains(&question) {
                            question_columns.insert(question.clone());
                        }
                        answers.insert(question, pair.answer.as_str());
                    }
                }
                None => warn!("No predictions found for {}", record.id()),
            }
            answer_maps.push(answers);
        }

        let columns: Vec<String> = metadata
            .iter()
            .cloned()
            .chain(question_columns.iter().cloned())
            .collect();

        let rows = records
            .iter()
            .zip(&answer_maps)
            .map(|(record, answers)| {
                let meta = metadata
                    .iter()
                    .map(|field| record.get(field).map(render_cell).unwrap_or_default());
                let qa = question_columns
                    .iter()
                    .map(|q| answers.get(q).map(|a| a.to_string()).unwrap_or_default());
                meta.chain(qa).collect()
            })
            .collect();

        info!(
            "Pivoted {} records into {} columns ({} questions)",
            records.len(),
            columns.len(),
            question_columns.len()
        );

        Self { columns, rows }
    }

    /// Write the report as RFC 4180 CSV
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        write_row(&mut out, &self.columns)?;
        for row in &self.rows {
            write_row(&mut out, row)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Render the report as a CSV string
    pub fn to_csv(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn write_row<W: Write>(out: &mut W, cells: &[String]) -> Result<()> {
    let line = cells.iter().map(|c| quote(c)).collect::<Vec<_>>().join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::to_qa_pairs;
    use crate::parser::extract;
    use payqa_domain::{Answer, QaPair};
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(0, value).unwrap()
    }

    fn metadata(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_pivot_columns_and_rows() {
        let records = vec![
            record(json!({"record_id": "A", "vendor": "Acme", "amount": 120.5})),
            record(json!({"record_id": "B", "vendor": "Globex, Inc."})),
        ];
        let predictions = vec![
            PredictionRecord::new(
                "B",
                vec![
                    QaPair::new("Was it approved?", Answer::No),
                    QaPair::new(" Is vendor listed? ", Answer::Yes),
                ],
            ),
            PredictionRecord::new("A", vec![QaPair::new("Was it approved?", Answer::Yes)]),
        ];

        let report = Report::build(
            &records,
            &predictions,
            &metadata(&["record_id", "vendor", "amount"]),
        );
        assert_eq!(
            report.columns,
            vec!["record_id", "vendor", "amount", "Is vendor listed?", "Was it approved?"]
        );
        assert_eq!(report.rows[0], vec!["A", "Acme", "120.5", "", "Yes"]);
        assert_eq!(report.rows[1], vec!["B", "Globex, Inc.", "", "Yes", "No"]);

        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "record_id,vendor,amount,Is vendor listed?,Was it approved?");
        assert_eq!(lines[2], "B,\"Globex, Inc.\",,Yes,No");
    }

    #[test]
    fn test_reply_casing_does_not_split_columns() {
        let questions = vec!["Was it approved?".to_string()];
        let records = vec![record(json!({"record_id": "A"})), record(json!({"record_id": "B"}))];
        let predictions = vec![
            PredictionRecord::new(
                "A",
                to_qa_pairs(
                    &extract(r#"[{"question": "was it APPROVED?", "answer": "yes"}]"#),
                    &questions,
                ),
            ),
            PredictionRecord::new(
                "B",
                to_qa_pairs(
                    &extract(r#"[{"question": "Was it approved?", "answer": "no"}]"#),
                    &questions,
                ),
            ),
        ];

        let report = Report::build(&records, &predictions, &metadata(&["record_id"]));
        assert_eq!(report.columns, vec!["record_id", "Was it approved?"]);
        assert_eq!(report.rows, vec![vec!["A", "Yes"], vec!["B", "No"]]);
    }

    #[test]
    fn test_record_without_prediction() {
        let records = vec![record(json!({"record_id": "A"})), record(json!({"record_id": "Z"}))];
        let predictions = vec![PredictionRecord::new(
            "A",
            vec![QaPair::new("Q1", Answer::NotApplicable)],
        )];

        let report = Report::build(&records, &predictions, &metadata(&["record_id"]));
        assert_eq!(report.rows[0], vec!["A", "Not Applicable"]);
        assert_eq!(report.rows[1], vec!["Z", ""]);
    }

    #[test]
    fn test_no_predictions_at_all() {
        let records = vec![record(json!({"record_id": "A"}))];
        let report = Report::build(&records, &[], &metadata(&["record_id"]));
        assert_eq!(report.to_csv(), "record_id\nA\n");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_load_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.jsonl");
        fs::write(
            &path,
            "{\"record_id\":\"A\",\"answers\":[{\"question\":\"Q1\",\"answer\":\"yes\"}]}\n\n{\"record_id\":\"B\",\"answers\":[]}\n",
        )
        .unwrap();

        let predictions = load_predictions(&path).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].answers[0].answer, Answer::Yes);
        assert!(predictions[1].is_empty());
    }
}
