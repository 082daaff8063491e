use crate::template::JsonPointer;
use crate::types::{AuthRef, Bundle, StageContent, VariableAssignment, VariableLocation};
use crate::validate::rules::common::validate_variable_name;
use crate::validate::validator::{Validator, METHOD_RE};

pub(crate) fn validate_stage_content(v: &mut Validator, bundle: &Bundle, content: &StageContent, path: &str) {
    if !METHOD_RE.is_match(&content.request.method) {
        v.push(
            format!("{path}.request.method"),
            format!("invalid HTTP method '{}'", content.request.method),
        );
    }
    if content.request.url.trim().is_empty() {
        v.push(format!("{path}.request.url"), "must not be empty");
    }

    for (idx, auth) in content.auth.iter().enumerate() {
        validate_auth_entry(v, bundle, auth, &format!("{path}.auth[{idx}]"));
    }

    if let Some(default) = &content.default_response {
        if !content.responses.contains_key(default) {
            v.push(
                format!("{path}.defaultResponse"),
                format!("no response declared for '{default}'"),
            );
        }
    }

    for (status, response) in &content.responses {
        if !is_status_key(status) {
            v.push(
                format!("{path}.responses.{status}"),
                "response key must be a status code, a class like 2XX, or 'default'",
            );
        }
        for (idx, a) in response.variable_assignments.iter().enumerate() {
            validate_assignment(
                v,
                a,
                &format!("{path}.responses.{status}.variableAssignments[{idx}]"),
            );
        }
    }
}

fn validate_auth_entry(v: &mut Validator, bundle: &Bundle, auth: &str, path: &str) {
    let r = AuthRef::parse(auth);
    let Some(cred) = bundle.credential(r.name) else {
        v.push(path, format!("unknown credential '{}'", r.name));
        return;
    };
    if let Some(m) = r.method {
        if !cred.methods.contains_key(m) {
            v.push(path, format!("credential '{}' has no method '{m}'", r.name));
        }
    }
}

fn is_status_key(key: &str) -> bool {
    if key == "default" {
        return true;
    }
    let bytes = key.as_bytes();
    if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
        return false;
    }
    let rest = &key[1..];
    rest.chars().all(|c| c.is_ascii_digit()) || rest.eq_ignore_ascii_case("xx")
}

pub(crate) fn validate_assignment(v: &mut Validator, a: &VariableAssignment, path: &str) {
    validate_variable_name(v, &format!("{path}.name"), &a.name);
    match (a.location, a.path.as_deref()) {
        (VariableLocation::StatusCode, _) => {}
        (VariableLocation::Body, Some(p)) if p.starts_with('$') => {}
        (VariableLocation::Body, Some(p)) => {
            if let Err(e) = JsonPointer::parse(p) {
                v.push(format!("{path}.path"), format!("invalid json pointer: {e}"));
            }
        }
        (VariableLocation::Body, None) => {}
        (loc, None) => {
            v.push(format!("{path}.path"), format!("required for '{loc}' assignments"));
        }
        (_, Some(_)) => {}
    }
}
