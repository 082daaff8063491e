use std::collections::BTreeMap;

use playbook_core::types::Bundle;
use serde_json::Value as JsonValue;

use crate::env::{dynamic_entry, EnvStack, EnvStackEntry};

pub const DEFAULT_ENVIRONMENT: &str = "default";
pub const INPUTS_ENTRY_ID: &str = "inputs";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}

/// Resolves a bundle environment against the caller's external variables
/// (process environment, an env file, ...).
pub fn environment_entry(
    bundle: &Bundle,
    name: &str,
    external: &BTreeMap<String, String>,
) -> Result<EnvStackEntry, SeedError> {
    let def = bundle
        .environments
        .get(name)
        .ok_or_else(|| SeedError::UnknownEnvironment(name.to_string()))?;

    let mut env = BTreeMap::new();
    let mut missing = Vec::new();
    for (var, spec) in &def.variables {
        match external.get(&spec.name) {
            Some(v) => {
                env.insert(var.clone(), JsonValue::String(v.clone()));
            }
            None => match &spec.default {
                Some(d) => {
                    env.insert(var.clone(), d.clone());
                }
                None if spec.required => missing.push(spec.name.clone()),
                None => {}
            },
        }
    }

    if !missing.is_empty() {
        return Err(SeedError::MissingRequired(missing));
    }
    Ok(EnvStackEntry::new(format!("environment:{name}"), env))
}

pub fn inputs_entry(inputs: BTreeMap<String, JsonValue>) -> EnvStackEntry {
    EnvStackEntry::new(INPUTS_ENTRY_ID, inputs)
}

/// Builds the standard seed `[functions, environment:<name>, inputs]`.
///
/// Without an explicit name the `default` environment is used when the bundle declares
/// one; an empty `inputs` map adds no entry.
pub fn build_seed(
    bundle: &Bundle,
    environment: Option<&str>,
    external: &BTreeMap<String, String>,
    inputs: BTreeMap<String, JsonValue>,
) -> Result<EnvStack, SeedError> {
    let mut stack = EnvStack::new();
    stack.push(dynamic_entry());

    let env_name = match environment {
        Some(n) => Some(n),
        None if bundle.environments.contains_key(DEFAULT_ENVIRONMENT) => Some(DEFAULT_ENVIRONMENT),
        None => None,
    };
    if let Some(n) = env_name {
        stack.push(environment_entry(bundle, n, external)?);
    }

    if !inputs.is_empty() {
        stack.push(inputs_entry(inputs));
    }
    Ok(stack)
}
