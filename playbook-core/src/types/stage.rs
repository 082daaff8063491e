use std::collections::BTreeMap;
use std::fmt;

use crate::types::{RequestTemplate, ValueMap, VariableAssignment};

/// One HTTP interaction of a playbook: either a pointer into the bundle or inline content.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Stage {
    Reference(StageReference),
    External(ExternalStage),
}

impl Stage {
    pub fn reference(reference: RequestRef) -> Self {
        Stage::Reference(StageReference {
            reference,
            environment: ValueMap::new(),
        })
    }

    pub fn request_ref(&self) -> Option<&RequestRef> {
        match self {
            Stage::Reference(r) => Some(&r.reference),
            Stage::External(_) => None,
        }
    }

    pub fn environment(&self) -> &ValueMap {
        match self {
            Stage::Reference(r) => &r.environment,
            Stage::External(e) => &e.environment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageReference {
    #[serde(rename = "ref")]
    pub reference: RequestRef,

    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub environment: ValueMap,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExternalStage {
    #[serde(flatten)]
    pub content: StageContent,

    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub environment: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestRef {
    Operation {
        id: String,
    },
    Request {
        id: String,
    },
    /// Position inside the acquisition stages of a credential method
    /// (the credential's `default` method when `method` is absent).
    Credential {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        #[serde(default)]
        position: usize,
    },
}

impl RequestRef {
    pub fn operation(id: impl Into<String>) -> Self {
        RequestRef::Operation { id: id.into() }
    }

    pub fn request(id: impl Into<String>) -> Self {
        RequestRef::Request { id: id.into() }
    }

    pub fn id(&self) -> &str {
        match self {
            RequestRef::Operation { id }
            | RequestRef::Request { id }
            | RequestRef::Credential { id, .. } => id,
        }
    }
}

impl fmt::Display for RequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestRef::Operation { id } => write!(f, "operation:{id}"),
            RequestRef::Request { id } => write!(f, "request:{id}"),
            RequestRef::Credential {
                id,
                method: Some(m),
                position,
            } => write!(f, "credential:{id}/{m}[{position}]"),
            RequestRef::Credential {
                id,
                method: None,
                position,
            } => write!(f, "credential:{id}[{position}]"),
        }
    }
}

/// Request template plus the auth requirements and response rules attached to it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,

    pub request: RequestTemplate,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "defaultResponse")]
    pub default_response: Option<String>,

    /// Keyed by exact status (`"200"`), status class (`"2XX"`) or `"default"`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, ResponseDefinition>,
}

impl StageContent {
    /// Picks the response definition for an actual status: exact code, then `NXX`,
    /// then `default`, then the declared `defaultResponse`.
    pub fn response_for(&self, status: u16) -> Option<&ResponseDefinition> {
        let exact = status.to_string();
        let class = format!("{}XX", status / 100);
        self.responses
            .get(&exact)
            .or_else(|| {
                self.responses
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(&class))
                    .map(|(_, v)| v)
            })
            .or_else(|| self.responses.get("default"))
            .or_else(|| {
                self.default_response
                    .as_ref()
                    .and_then(|k| self.responses.get(k))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseDefinition {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "variableAssignments")]
    pub variable_assignments: Vec<VariableAssignment>,
}
