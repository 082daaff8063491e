use std::collections::BTreeMap;

pub type AnyValue = serde_json::Value;

/// A string that may carry `{{name}}` tokens resolved against the environment stack.
pub type TemplateString = String;

/// Named templated values, e.g. a stage-level environment or a parameter group.
pub type ValueMap = BTreeMap<String, AnyValue>;
