//! Control set module - shared control definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mapping from control name to its parameters
///
/// Parameters are free-form (lists, thresholds, whitelists). Keys are kept in
/// sorted order so the rendered form is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlSet(Map<String, Value>);

impl ControlSet {
    /// Create an empty control set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a control
    pub fn insert(&mut self, name: impl Into<String>, params: Value) {
        self.0.insert(name.into(), params);
    }

    /// Look up a control by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of controls
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no controls are defined
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Control names in rendering order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Human-readable structured form used inside prompts
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Map<String, Value>> for ControlSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
