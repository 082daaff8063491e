use playbook_core::types::{Bundle, RequestRef, Stage};
use serde::{Deserialize, Serialize};

use crate::executor::resolver::{resolve_ref, ResolveError};

pub const GLOBAL_BEFORE: &str = "Global Before";
pub const BEFORE: &str = "Before";
pub const SCENARIO: &str = "Scenario";
pub const AFTER: &str = "After";
pub const GLOBAL_AFTER: &str = "Global After";
pub const REQUEST: &str = "Request";

/// A named, ordered list of stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub name: String,
    pub stages: Vec<Stage>,
}

impl Playbook {
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            stages,
        }
    }
}

/// Playbooks for one operation scenario: global before, operation before, the scenario,
/// operation after, global after. Empty surrounding lists are left out.
///
/// `scenario` selects by key; without one the operation's first scenario runs.
pub fn scenario_playbooks(
    bundle: &Bundle,
    operation_id: &str,
    scenario: Option<&str>,
) -> Result<Vec<Playbook>, ResolveError> {
    let op = bundle
        .operation(operation_id)
        .ok_or_else(|| ResolveError::Operation(operation_id.to_string()))?;
    let selected = match scenario {
        Some(key) => op.scenario(key).map(|(_, s)| s),
        None => op.scenarios.first(),
    };
    let selected = selected.ok_or_else(|| ResolveError::Scenario {
        operation: operation_id.to_string(),
        scenario: scenario.unwrap_or("<first>").to_string(),
    })?;

    let mut out = Vec::new();
    push_non_empty(&mut out, GLOBAL_BEFORE, &bundle.before);
    push_non_empty(&mut out, BEFORE, &op.before);
    out.push(Playbook::new(SCENARIO, selected.requests.clone()));
    push_non_empty(&mut out, AFTER, &op.after);
    push_non_empty(&mut out, GLOBAL_AFTER, &bundle.after);
    Ok(out)
}

/// Playbooks for sending a single operation or request on its own, wrapped in the
/// bundle's global before and after lists.
pub fn request_playbooks(bundle: &Bundle, reference: RequestRef) -> Result<Vec<Playbook>, ResolveError> {
    resolve_ref(bundle, &reference)?;

    let mut out = Vec::new();
    push_non_empty(&mut out, GLOBAL_BEFORE, &bundle.before);
    out.push(Playbook::new(REQUEST, vec![Stage::reference(reference)]));
    push_non_empty(&mut out, GLOBAL_AFTER, &bundle.after);
    Ok(out)
}

fn push_non_empty(out: &mut Vec<Playbook>, name: &str, stages: &[Stage]) {
    if !stages.is_empty() {
        out.push(Playbook::new(name, stages.to_vec()));
    }
}
