//! Recover structured answers from free-text backend replies

use serde_json::{Map, Value};
use tracing::debug;

/// Extract the JSON array of QA objects from a backend reply
///
/// Code-fence markers are stripped, then the text between the first `[` and
/// the last `]` is parsed. Anything that cannot be recovered yields an empty
/// list; this function never fails. Array elements that are not JSON objects
/// are dropped.
pub fn extract(raw_text: &str) -> Vec<Map<String, Value>> {
    let cleaned = strip_fences(raw_text);

    let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) else {
        debug!("No JSON array found in reply ({} chars)", raw_text.len());
        return Vec::new();
    };
    if end < start {
        debug!("Unbalanced brackets in reply");
        return Vec::new();
    }

    match serde_json::from_str::<Vec<Value>>(&cleaned[start..=end]) {
        Ok(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(obj) => Some(obj),
                _ => None,
            })
            .collect(),
        Err(e) => {
            debug!("Reply array failed to parse: {}", e);
            Vec::new()
        }
    }
}

/// Remove markdown code-fence markers at line starts and line ends
fn strip_fences(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line
                .strip_prefix("```json")
                .or_else(|| line.strip_prefix("```"))
                .unwrap_or(line);
            line.strip_suffix("```").unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_array() {
        let items = extract(r#"[{"question": "Q1", "answer": "Yes"}]"#);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["question"], "Q1");
    }

    #[test]
    fn test_fenced_array() {
        let reply = "```json\n[{\"question\":\"Q1\",\"answer\":\"yes\"},{\"question\":\"Q2\",\"answer\":\"no\"}]\n```";
        let items = extract(reply);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["answer"], "no");
    }

    #[test]
    fn test_fence_without_language() {
        let reply = "```\n[{\"question\":\"Q1\",\"answer\":\"No\"}]\n```";
        assert_eq!(extract(reply).len(), 1);
    }

    #[test]
    fn test_prose_around_array() {
        let reply = "Sure! Here are the answers:\n[{\"question\": \"Q1\", \"answer\": \"No\"}]\nLet me know if you need more.";
        assert_eq!(extract(reply).len(), 1);
    }

    #[test]
    fn test_unrecoverable_replies_are_empty() {
        assert!(extract("").is_empty());
        assert!(extract("Not a JSON array at all").is_empty());
        assert!(extract("[ unterminated").is_empty());
        assert!(extract("] backwards [").is_empty());
        assert!(extract("[this is not json]").is_empty());
        assert!(extract("{\"question\": \"Q1\"}").is_empty());
    }

    #[test]
    fn test_non_object_elements_dropped() {
        let items = extract(r#"["Yes", {"question": "Q1", "answer": "Yes"}, 3]"#);
        assert_eq!(items.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_extract_never_panics(raw in ".*") {
            let _ = extract(&raw);
        }

        #[test]
        fn prop_extract_is_idempotent(
            pairs in proptest::collection::vec(("[a-zA-Z0-9 ?,]{0,40}", "[a-zA-Z ']{0,16}"), 0..8),
            wrapping in 0usize..3,
        ) {
            let array: Vec<Value> = pairs
                .iter()
                .map(|(q, a)| serde_json::json!({"question": q, "answer": a}))
                .collect();
            let body = serde_json::to_string(&array).unwrap();
            let reply = match wrapping {
                0 => format!("```json\n{}\n```", body),
                1 => format!("```\n{}\n```", body),
                _ => format!("Here are the answers:\n{}\nLet me know.", body),
            };

            let first = extract(&reply);
            prop_assert_eq!(first.len(), pairs.len());
            let again = extract(&serde_json::to_string(&first).unwrap());
            prop_assert_eq!(first, again);
        }

        #[test]
        fn prop_unclosed_bracket_is_empty(prefix in "[^\\]]*") {
            let raw = format!("{}[", prefix);
            prop_assert!(extract(&raw).is_empty());
        }
    }
}
