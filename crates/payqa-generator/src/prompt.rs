//! Prompt construction for control evaluation

use crate::error::{GeneratorError, Result};
use payqa_domain::record::QUESTIONS_FIELD;
use payqa_domain::{ControlSet, Exemplar, Record};
use serde::Serialize;

/// Builds evaluation prompts
///
/// The builder holds the run-wide parts of a prompt (controls and exemplars);
/// each call to [`PromptBuilder::build`] renders one record. Output is a pure
/// function of the inputs.
pub struct PromptBuilder<'a> {
    controls: &'a ControlSet,
    exemplars: &'a [Exemplar],
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(controls: &'a ControlSet, exemplars: &'a [Exemplar]) -> Self {
        Self {
            controls,
            exemplars,
        }
    }

    /// Build the complete prompt for one record
    pub fn build(&self, record: &Record, questions: &[String]) -> String {
        let controls = self.controls.render();
        let mut prompt = String::new();

        // 1. Control definitions
        prompt.push_str("Control definitions:\n");
        prompt.push_str(&controls);
        prompt.push_str("\n\n");

        // 2. Output schema and instructions
        prompt.push_str(SCHEMA_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 3. Worked examples
        if self.exemplars.is_empty() {
            prompt.push_str("(No few-shot examples configured)\n\n");
        }
        for exemplar in self.exemplars {
            prompt.push_str("Payment record (example):\n");
            prompt.push_str(&render(&exemplar.record));
            prompt.push_str("\n\nControls (example):\n");
            prompt.push_str(&exemplar.controls_or(self.controls).render());
            prompt.push_str("\n\nQA pairs (example):\n");
            prompt.push_str(&render(&exemplar.qa_pairs));
            prompt.push_str("\n\n");
            prompt.push_str(EXAMPLE_DELIMITER);
        }

        // 4. Target record, controls and questions
        prompt.push_str("Payment record:\n");
        prompt.push_str(&render(record));
        prompt.push_str("\n\nControls:\n");
        prompt.push_str(&controls);
        prompt.push_str("\n\nQuestions:\n");
        prompt.push_str(&render(&questions));
        prompt.push_str("\n\n");

        // 5. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// Render the prompt for one record
///
/// Questions come from the record's own `questions` attribute, or from
/// `questions` when the record has none.
///
/// # Errors
///
/// Returns [`GeneratorError::MissingField`] when neither source provides a
/// question.
pub fn build_prompt(
    record: &Record,
    controls: &ControlSet,
    questions: &[String],
    exemplars: &[Exemplar],
) -> Result<String> {
    let questions = questions_for(record, questions)?;
    Ok(PromptBuilder::new(controls, exemplars).build(record, questions))
}

/// Questions to pose to `record`, or [`GeneratorError::MissingField`]
pub(crate) fn questions_for<'a>(record: &'a Record, shared: &'a [String]) -> Result<&'a [String]> {
    record
        .effective_questions(shared)
        .ok_or_else(|| GeneratorError::MissingField {
            record_id: record.id().to_string(),
            field: QUESTIONS_FIELD.to_string(),
        })
}

fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

const SCHEMA_INSTRUCTIONS: &str = r#"Output schema:
[
  { "question": "string", "answer": "Yes|No|Not Applicable" }
]

You are an auditor assessing payment controls. Return ONLY a JSON array matching the schema above. No extra text."#;

const EXAMPLE_DELIMITER: &str = "---\n\n";

const OUTPUT_FORMAT_REMINDER: &str = r#"Return a JSON array of QA pairs, one per question, with answer exactly one of "Yes", "No", "Not Applicable":
[
  { "question": "...", "answer": "Yes" },
  ...
]
"#;
