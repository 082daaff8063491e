use std::collections::BTreeMap;

use playbook_core::types::VariableAssignment;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One named variable scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvStackEntry {
    pub id: String,
    pub env: BTreeMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<VariableAssignment>,
}

impl EnvStackEntry {
    pub fn new(id: impl Into<String>, env: BTreeMap<String, JsonValue>) -> Self {
        Self {
            id: id.into(),
            env,
            assignments: Vec::new(),
        }
    }

    pub fn with_assignments(mut self, assignments: Vec<VariableAssignment>) -> Self {
        self.assignments = assignments;
        self
    }
}

/// Ordered variable scopes. Lookups scan from the most recently pushed entry back to the
/// seed, so later scopes shadow earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvStack {
    entries: Vec<EnvStackEntry>,
}

impl EnvStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: EnvStackEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[EnvStackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<&JsonValue> {
        self.lookup_entry(name).map(|(_, v)| v)
    }

    /// Like [`lookup`](Self::lookup) but also returns the id of the scope that won.
    pub fn lookup_entry(&self, name: &str) -> Option<(&str, &JsonValue)> {
        self.entries
            .iter()
            .rev()
            .find_map(|e| e.env.get(name).map(|v| (e.id.as_str(), v)))
    }

    /// A copy with `entry` layered on top; `self` is left untouched.
    pub fn layered(&self, entry: EnvStackEntry) -> EnvStack {
        let mut out = self.clone();
        out.push(entry);
        out
    }

    /// Entries pushed after the first `len` ones.
    pub fn entries_since(&self, len: usize) -> &[EnvStackEntry] {
        self.entries.get(len..).unwrap_or(&[])
    }
}

impl From<Vec<EnvStackEntry>> for EnvStack {
    fn from(entries: Vec<EnvStackEntry>) -> Self {
        Self { entries }
    }
}

impl Extend<EnvStackEntry> for EnvStack {
    fn extend<T: IntoIterator<Item = EnvStackEntry>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
