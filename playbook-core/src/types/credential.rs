use std::collections::BTreeMap;

use crate::types::{Stage, TemplateString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialType {
    Basic,
    ApiKey,
    Bearer,
    Oauth2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialLocation {
    Header,
    Query,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Credential {
    #[serde(rename = "type")]
    pub kind: CredentialType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "in")]
    pub location: Option<CredentialLocation>,

    /// Header, query or cookie name for `apiKey` credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub default: String,

    pub methods: BTreeMap<String, CredentialMethod>,
}

impl Credential {
    pub fn method(&self, name: Option<&str>) -> Option<(&str, &CredentialMethod)> {
        let name = name.unwrap_or(&self.default);
        self.methods
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CredentialMethod {
    /// Token template, e.g. `{{access_token}}` or `{{user}}:{{password}}`.
    pub credential: TemplateString,

    /// Acquisition stages (e.g. a login call) run before the value is resolved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<Stage>,
}

/// `name` or `name/method` as written in a stage's `auth` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRef<'a> {
    pub name: &'a str,
    pub method: Option<&'a str>,
}

impl<'a> AuthRef<'a> {
    pub fn parse(s: &'a str) -> Self {
        match s.split_once('/') {
            Some((name, method)) if !method.is_empty() => AuthRef {
                name,
                method: Some(method),
            },
            Some((name, _)) => AuthRef { name, method: None },
            None => AuthRef {
                name: s,
                method: None,
            },
        }
    }
}
