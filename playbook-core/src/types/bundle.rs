use std::collections::BTreeMap;

use crate::types::{
    AuthRef, Credential, EnvironmentDefinition, RequestRef, Stage, StageContent,
};

/// A parsed playbook configuration. Read-only for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub operations: BTreeMap<String, Operation>,

    #[serde(default)]
    pub requests: BTreeMap<String, StageContent>,

    #[serde(default, rename = "authenticationDetails")]
    pub authentication_details: Vec<BTreeMap<String, Credential>>,

    #[serde(default)]
    pub before: Vec<Stage>,

    #[serde(default)]
    pub after: Vec<Stage>,

    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentDefinition>,

    #[serde(default, rename = "authorizationTests")]
    pub authorization_tests: BTreeMap<String, AuthorizationTest>,
}

impl Bundle {
    /// Looks a credential up across the groups in declaration order.
    pub fn credential(&self, name: &str) -> Option<&Credential> {
        self.authentication_details
            .iter()
            .find_map(|group| group.get(name))
    }

    pub fn credential_names(&self) -> impl Iterator<Item = &str> {
        self.authentication_details
            .iter()
            .flat_map(|group| group.keys().map(String::as_str))
    }

    pub fn has_credential(&self, auth: &str) -> bool {
        self.credential(AuthRef::parse(auth).name).is_some()
    }

    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.get(id)
    }

    /// Every stage list of the bundle with a dotted location path, for validation
    /// and tooling.
    pub fn stage_lists(&self) -> Vec<(String, &[Stage])> {
        let mut out: Vec<(String, &[Stage])> = vec![
            ("$.before".to_string(), self.before.as_slice()),
            ("$.after".to_string(), self.after.as_slice()),
        ];
        for (id, op) in &self.operations {
            out.push((format!("$.operations.{id}.before"), op.before.as_slice()));
            out.push((format!("$.operations.{id}.after"), op.after.as_slice()));
            for (idx, sc) in op.scenarios.iter().enumerate() {
                out.push((
                    format!("$.operations.{id}.scenarios[{idx}].requests"),
                    sc.requests.as_slice(),
                ));
            }
        }
        for (gidx, group) in self.authentication_details.iter().enumerate() {
            for (name, cred) in group {
                for (mname, method) in &cred.methods {
                    out.push((
                        format!("$.authenticationDetails[{gidx}].{name}.methods.{mname}.requests"),
                        method.requests.as_slice(),
                    ));
                }
            }
        }
        out
    }

    pub fn has_target(&self, reference: &RequestRef) -> bool {
        match reference {
            RequestRef::Operation { id } => self.operations.contains_key(id),
            RequestRef::Request { id } => self.requests.contains_key(id),
            RequestRef::Credential {
                id,
                method,
                position,
            } => self
                .credential(id)
                .and_then(|c| c.method(method.as_deref()))
                .is_some_and(|(_, m)| *position < m.requests.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: String,

    pub request: StageContent,

    #[serde(default)]
    pub before: Vec<Stage>,

    #[serde(default)]
    pub after: Vec<Stage>,

    #[serde(default)]
    pub scenarios: Vec<Scenario>,

    #[serde(default, rename = "authorizationTests")]
    pub authorization_tests: Vec<String>,
}

impl Operation {
    pub fn scenario(&self, key: &str) -> Option<(usize, &Scenario)> {
        self.scenarios.iter().enumerate().find(|(_, s)| s.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    pub key: String,

    #[serde(default)]
    pub requests: Vec<Stage>,
}

/// Credential-swapping check declared in the bundle. Carried and validated only.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuthorizationTest {
    pub key: String,

    #[serde(default)]
    pub source: Vec<String>,

    #[serde(default)]
    pub target: Vec<String>,
}
