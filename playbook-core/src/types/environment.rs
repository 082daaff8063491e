use std::collections::BTreeMap;

use crate::types::AnyValue;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentDefinition {
    #[serde(default)]
    pub variables: BTreeMap<String, EnvironmentVariable>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentSource {
    #[default]
    Environment,
}

/// A bundle variable bound to an entry of the caller's external environment.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentVariable {
    #[serde(default)]
    pub from: EnvironmentSource,

    /// Name looked up in the external environment.
    pub name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<AnyValue>,
}
