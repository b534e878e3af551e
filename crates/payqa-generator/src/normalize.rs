//! Turn extracted reply objects into ordered question/answer pairs

use payqa_domain::{Answer, QaPair};
use serde_json::{Map, Value};

/// Map a raw answer token onto the closed answer vocabulary
///
/// Total: any input, including the empty string, yields an [`Answer`].
pub fn normalize(raw_answer: &str) -> Answer {
    Answer::normalize(raw_answer)
}

/// Convert extracted reply objects into [`QaPair`]s in posed-question order
///
/// The backend may reorder its answers, so pairs are matched to `questions`
/// by trimmed, case-insensitive question text. Matched pairs come first, in
/// the order the questions were posed and carry the posed question text, not
/// the backend's spelling of it. Pairs that match no posed question, or repeat
/// one already matched, follow in reply order. Questions the backend did not
/// answer are left out.
pub fn to_qa_pairs(items: &[Map<String, Value>], questions: &[String]) -> Vec<QaPair> {
    let pairs: Vec<QaPair> = items.iter().map(pair_from_object).collect();

    let mut slots: Vec<Option<QaPair>> = vec![None; questions.len()];
    let mut extras = Vec::new();
    let keys: Vec<String> = questions.iter().map(|q| match_key(q)).collect();

    for mut pair in pairs {
        let key = match_key(&pair.question);
        match keys.iter().position(|k| *k == key) {
            Some(idx) if slots[idx].is_none() => {
                pair.question = questions[idx].clone();
                slots[idx] = Some(pair);
            }
            _ => extras.push(pair),
        }
    }

    slots.into_iter().flatten().chain(extras).collect()
}

fn pair_from_object(obj: &Map<String, Value>) -> QaPair {
    let question = obj
        .get("question")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    let answer = obj
        .get("answer")
        .and_then(Value::as_str)
        .map(normalize)
        .unwrap_or_default();

    QaPair { question, answer }
}

fn match_key(question: &str) -> String {
    question.trim().to_lowercase()
}
