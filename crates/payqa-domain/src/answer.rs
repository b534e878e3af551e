//! Answer module - the closed answer vocabulary

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Answer to a single evaluation question
///
/// Only three values exist. Any token the backend produces is mapped onto one
/// of them by [`Answer::normalize`], which never fails: unknown tokens become
/// [`Answer::NotApplicable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Answer {
    /// The control criterion is satisfied
    Yes,

    /// The control criterion is violated
    No,

    /// The criterion does not apply, or the answer could not be understood
    #[default]
    NotApplicable,
}

impl Answer {
    /// All answers, in display order
    pub const ALL: [Answer; 3] = [Answer::Yes, Answer::No, Answer::NotApplicable];

    /// Canonical label used in prompts and output files
    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
            Answer::NotApplicable => "Not Applicable",
        }
    }

    /// Map a free-text token onto the answer vocabulary
    ///
    /// Surrounding whitespace and one layer of matching quote characters are
    /// removed, then the token is compared case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use payqa_domain::Answer;
    ///
    /// assert_eq!(Answer::normalize("YES"), Answer::Yes);
    /// assert_eq!(Answer::normalize("'yes'"), Answer::Yes);
    /// assert_eq!(Answer::normalize(" No "), Answer::No);
    /// assert_eq!(Answer::normalize("not applicable"), Answer::NotApplicable);
    /// assert_eq!(Answer::normalize("maybe"), Answer::NotApplicable);
    /// assert_eq!(Answer::normalize(""), Answer::NotApplicable);
    /// ```
    pub fn normalize(raw: &str) -> Self {
        let token = strip_quotes(raw.trim()).trim().to_lowercase();

        match token.as_str() {
            "yes" => Answer::Yes,
            "no" => Answer::No,
            "not applicable" => Answer::NotApplicable,
            _ => Answer::NotApplicable,
        }
    }
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Answer {
    fn from(raw: &str) -> Self {
        Answer::normalize(raw)
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Non-string tokens (numbers, booleans, null) carry no usable answer.
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => Answer::normalize(&s),
            _ => Answer::NotApplicable,
        })
    }
}
