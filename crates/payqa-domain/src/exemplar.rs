//! Exemplar module - worked examples for few-shot prompting

use crate::control::ControlSet;
use crate::prediction::QaPair;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A worked example embedded in prompts to steer the backend
///
/// The example record is kept as raw JSON: exemplar records are illustrative
/// and need not carry a `record_id`. Stored exemplars written for the payment
/// pipeline use the key `payment`, which is accepted as an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    /// Example record shown to the backend
    #[serde(alias = "payment")]
    pub record: Value,

    /// Control set for this example, if it differs from the global one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<ControlSet>,

    /// Expected question/answer pairs, in order
    pub qa_pairs: Vec<QaPair>,
}

impl Exemplar {
    /// Controls to render for this example, falling back to `global`
    pub fn controls_or<'a>(&'a self, global: &'a ControlSet) -> &'a ControlSet {
        self.controls.as_ref().unwrap_or(global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Answer;
    use serde_json::json;

    #[test]
    fn test_parse_with_payment_alias() {
        let exemplar: Exemplar = serde_json::from_value(json!({
            "payment": {"amount": 120.5, "vendor": "Acme"},
            "qa_pairs": [{"question": "Is the vendor approved?", "answer": "yes"}]
        }))
        .unwrap();

        assert_eq!(exemplar.record["vendor"], "Acme");
        assert!(exemplar.controls.is_none());
        assert_eq!(exemplar.qa_pairs[0].answer, Answer::Yes);
    }

    #[test]
    fn test_controls_fallback() {
        let mut global = ControlSet::new();
        global.insert("global", json!(true));

        let mut own = ControlSet::new();
        own.insert("own", json!(true));

        let mut exemplar = Exemplar {
            record: json!({}),
            controls: None,
            qa_pairs: Vec::new(),
        };
        assert!(exemplar.controls_or(&global).get("global").is_some());

        exemplar.controls = Some(own);
        assert!(exemplar.controls_or(&global).get("own").is_some());
    }

    #[test]
    fn test_missing_qa_pairs_is_rejected() {
        let result: Result<Exemplar, _> = serde_json::from_value(json!({"record": {}}));
        assert!(result.is_err());
    }
}
