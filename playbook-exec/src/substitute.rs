//! `{{name}}` replacement over request templates.

use std::collections::BTreeMap;

use playbook_core::template::{parse_template, Segment};
use playbook_core::types::{RequestBody, RequestParameters, RequestTemplate, ValueMap};
use serde_json::Value as JsonValue;

use crate::env::EnvStack;

/// A substituted value plus the token names that resolved (`found`) and those that did
/// not (`missing`). Both lists keep first-seen order without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution<T> {
    pub value: T,
    pub found: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Default)]
struct Tracker {
    found: Vec<String>,
    missing: Vec<String>,
}

impl Tracker {
    fn record(&mut self, name: &str, hit: bool) {
        let list = if hit { &mut self.found } else { &mut self.missing };
        if !list.iter().any(|n| n == name) {
            list.push(name.to_string());
        }
    }

    fn finish<T>(self, value: T) -> Substitution<T> {
        Substitution {
            value,
            found: self.found,
            missing: self.missing,
        }
    }
}

/// Substitutes every string field of a request template: url, all parameter maps and the
/// body. Header and parameter names are left as written.
pub fn substitute_request(template: &RequestTemplate, stack: &EnvStack) -> Substitution<RequestTemplate> {
    let mut t = Tracker::default();
    let value = RequestTemplate {
        method: template.method.clone(),
        url: str_in(&template.url, stack, &mut t),
        parameters: RequestParameters {
            path: map_in(&template.parameters.path, stack, &mut t),
            query: map_in(&template.parameters.query, stack, &mut t),
            header: map_in(&template.parameters.header, stack, &mut t),
            cookie: map_in(&template.parameters.cookie, stack, &mut t),
        },
        body: template.body.as_ref().map(|b| RequestBody {
            media_type: b.media_type.clone(),
            value: value_in(&b.value, stack, &mut t),
        }),
    };
    t.finish(value)
}

/// Substitutes tokens inside an arbitrary JSON value.
///
/// A string that is exactly one token takes the variable's value with its JSON type
/// intact. Tokens embedded in longer strings are interpolated as text. Unresolved tokens
/// stay in place verbatim.
pub fn substitute_value(value: &JsonValue, stack: &EnvStack) -> Substitution<JsonValue> {
    let mut t = Tracker::default();
    let out = value_in(value, stack, &mut t);
    t.finish(out)
}

/// Substitutes tokens inside a plain string; the result is always text.
pub fn substitute_str(input: &str, stack: &EnvStack) -> Substitution<String> {
    let mut t = Tracker::default();
    let out = str_in(input, stack, &mut t);
    t.finish(out)
}

/// Substitutes the values of a string-keyed map.
pub fn substitute_map(map: &ValueMap, stack: &EnvStack) -> Substitution<BTreeMap<String, JsonValue>> {
    let mut t = Tracker::default();
    let out = map_in(map, stack, &mut t);
    t.finish(out)
}

fn map_in(map: &ValueMap, stack: &EnvStack, t: &mut Tracker) -> ValueMap {
    map.iter()
        .map(|(k, v)| (k.clone(), value_in(v, stack, t)))
        .collect()
}

fn value_in(value: &JsonValue, stack: &EnvStack, t: &mut Tracker) -> JsonValue {
    match value {
        JsonValue::String(s) => {
            let template = parse_template(s);
            if let Some(name) = template.single_token() {
                return match stack.lookup(name) {
                    Some(v) => {
                        t.record(name, true);
                        v.clone()
                    }
                    None => {
                        t.record(name, false);
                        value.clone()
                    }
                };
            }
            JsonValue::String(render(&template.segments, stack, t))
        }
        JsonValue::Array(items) => {
            JsonValue::Array(items.iter().map(|v| value_in(v, stack, t)).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_in(v, stack, t)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn str_in(input: &str, stack: &EnvStack, t: &mut Tracker) -> String {
    render(&parse_template(input).segments, stack, t)
}

fn render(segments: &[Segment], stack: &EnvStack, t: &mut Tracker) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Literal(text) => out.push_str(text),
            Segment::Token { name, source } => match stack.lookup(name) {
                Some(v) => {
                    t.record(name, true);
                    out.push_str(&text_of(v));
                }
                None => {
                    t.record(name, false);
                    out.push_str(source);
                }
            },
        }
    }
    out
}

/// Text form used when a value is interpolated into a longer string.
pub(crate) fn text_of(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
