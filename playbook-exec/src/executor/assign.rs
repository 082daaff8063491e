use std::collections::BTreeMap;

use playbook_core::template::{JsonPointer, JsonPointerError};
use playbook_core::types::{ExchangeSide, RequestTemplate, VariableAssignment, VariableLocation};
use serde_json::{json, Value as JsonValue};
use serde_json_path::JsonPath;
use url::Url;

use crate::env::EnvStackEntry;
use crate::transport::{HttpRequest, HttpResponse};

/// One completed request/response pair. `template` is the substituted request template,
/// which still knows the path parameter values by name.
pub struct Exchange<'x> {
    pub template: &'x RequestTemplate,
    pub request: &'x HttpRequest,
    pub response: &'x HttpResponse,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssignmentError {
    #[error("missing path for {0} assignment")]
    MissingPath(VariableLocation),
    #[error("{location} '{name}' not found in {side}")]
    NotFound {
        location: VariableLocation,
        name: String,
        side: &'static str,
    },
    #[error("{0} is not available on the request")]
    ResponseOnly(VariableLocation),
    #[error("{0} is not available on the response")]
    RequestOnly(VariableLocation),
    #[error("{0} body is empty")]
    EmptyBody(&'static str),
    #[error("{0} body is not JSON")]
    BodyNotJson(&'static str),
    #[error(transparent)]
    Pointer(#[from] JsonPointerError),
    #[error("invalid JSONPath '{path}': {message}")]
    InvalidJsonPath { path: String, message: String },
    #[error("JSONPath '{0}' matched nothing")]
    NoMatch(String),
}

fn side_name(side: ExchangeSide) -> &'static str {
    match side {
        ExchangeSide::Request => "request",
        ExchangeSide::Response => "response",
    }
}

/// Evaluates one rule against an exchange.
pub fn evaluate(rule: &VariableAssignment, exchange: &Exchange<'_>) -> Result<JsonValue, AssignmentError> {
    let side = side_name(rule.from);
    let named = |location| {
        rule.path
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(AssignmentError::MissingPath(location))
    };
    let not_found = |location, name: &str| AssignmentError::NotFound {
        location,
        name: name.to_string(),
        side,
    };

    match (rule.location, rule.from) {
        (VariableLocation::StatusCode, ExchangeSide::Response) => Ok(json!(exchange.response.status)),
        (VariableLocation::StatusCode, ExchangeSide::Request) => {
            Err(AssignmentError::ResponseOnly(VariableLocation::StatusCode))
        }
        (VariableLocation::Body, from) => {
            let body = match from {
                ExchangeSide::Request => exchange.request.body.as_deref().unwrap_or(""),
                ExchangeSide::Response => exchange.response.body.as_str(),
            };
            body_value(body, rule.path.as_deref(), side)
        }
        (VariableLocation::Header, from) => {
            let name = named(VariableLocation::Header)?;
            let value = match from {
                ExchangeSide::Request => exchange.request.header(name),
                ExchangeSide::Response => exchange.response.header(name),
            };
            value
                .map(|v| json!(v))
                .ok_or_else(|| not_found(VariableLocation::Header, name))
        }
        (VariableLocation::Query, ExchangeSide::Request) => {
            let name = named(VariableLocation::Query)?;
            Url::parse(&exchange.request.url)
                .ok()
                .and_then(|u| {
                    u.query_pairs()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| json!(v.into_owned()))
                })
                .ok_or_else(|| not_found(VariableLocation::Query, name))
        }
        (VariableLocation::Path, ExchangeSide::Request) => {
            let name = named(VariableLocation::Path)?;
            exchange
                .template
                .parameters
                .path
                .get(name)
                .cloned()
                .ok_or_else(|| not_found(VariableLocation::Path, name))
        }
        (VariableLocation::Query | VariableLocation::Path, ExchangeSide::Response) => {
            Err(AssignmentError::RequestOnly(rule.location))
        }
        (VariableLocation::Cookie, from) => {
            let name = named(VariableLocation::Cookie)?;
            let found = match from {
                ExchangeSide::Request => exchange
                    .request
                    .header("cookie")
                    .and_then(|c| find_cookie(c, name)),
                ExchangeSide::Response => exchange
                    .response
                    .header("set-cookie")
                    .and_then(|c| find_cookie(c, name)),
            };
            found
                .map(|v| json!(v))
                .ok_or_else(|| not_found(VariableLocation::Cookie, name))
        }
    }
}

fn body_value(body: &str, path: Option<&str>, side: &'static str) -> Result<JsonValue, AssignmentError> {
    if body.is_empty() {
        return Err(AssignmentError::EmptyBody(side));
    }
    let parsed: Option<JsonValue> = serde_json::from_str(body).ok();
    let path = path.filter(|p| !p.is_empty());

    let Some(path) = path else {
        return Ok(parsed.unwrap_or_else(|| JsonValue::String(body.to_string())));
    };
    let value = parsed.ok_or(AssignmentError::BodyNotJson(side))?;

    if path.starts_with('$') {
        let jsonpath = JsonPath::parse(path).map_err(|e| AssignmentError::InvalidJsonPath {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        return jsonpath
            .query(&value)
            .all()
            .into_iter()
            .next()
            .cloned()
            .ok_or_else(|| AssignmentError::NoMatch(path.to_string()));
    }

    let pointer = JsonPointer::parse(path)?;
    Ok(pointer.lookup(&value)?.clone())
}

fn find_cookie<'c>(header: &'c str, name: &str) -> Option<&'c str> {
    header
        .split([';', ','])
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim())
}

/// Applies every rule. Successes are gathered into a single stack entry tagged with the
/// rules that produced it; failures are returned per rule name and never abort the rest.
pub fn apply_assignments(
    id: &str,
    rules: &[VariableAssignment],
    exchange: &Exchange<'_>,
) -> (Option<EnvStackEntry>, Vec<(String, AssignmentError)>) {
    let mut env = BTreeMap::new();
    let mut applied = Vec::new();
    let mut errors = Vec::new();

    for rule in rules {
        match evaluate(rule, exchange) {
            Ok(v) => {
                env.insert(rule.name.clone(), v);
                applied.push(rule.clone());
            }
            Err(e) => errors.push((rule.name.clone(), e)),
        }
    }

    let entry = (!applied.is_empty()).then(|| EnvStackEntry::new(id, env).with_assignments(applied));
    (entry, errors)
}
