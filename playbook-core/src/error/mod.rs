use std::fmt;

use thiserror::Error;

/// Why a bundle document could not become a runnable [`Bundle`](crate::types::Bundle).
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("unreadable bundle: {0}")]
    Parse(#[from] ParseError),
    #[error("inconsistent bundle: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("bundle is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bundle is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("bundle document is empty")]
    Empty,
}

/// Every problem found in one validation pass, each pinned to a `$.`-rooted location.
#[derive(Debug, Error)]
#[error("{} problem(s){}", .violations.len(), first_location(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

fn first_location(violations: &[Violation]) -> String {
    violations
        .first()
        .map(|v| format!(", first at {v}"))
        .unwrap_or_default()
}

/// A dangling reference, a credential cycle or another bundle inconsistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
