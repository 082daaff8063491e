use playbook_core::types::{RequestBody, RequestTemplate};
use playbook_exec::env::{EnvStack, EnvStackEntry};
use playbook_exec::substitute::{substitute_request, substitute_str, substitute_value};
use serde_json::json;

fn stack() -> EnvStack {
    EnvStack::from(vec![EnvStackEntry::new(
        "vars",
        [
            ("host".to_string(), json!("http://localhost:8080")),
            ("id".to_string(), json!(42)),
            ("flags".to_string(), json!({ "a": true })),
            ("name".to_string(), json!("alice")),
        ]
        .into(),
    )])
}

#[test]
fn single_token_keeps_json_type() {
    let s = substitute_value(&json!({ "id": "{{id}}", "flags": "{{ flags }}" }), &stack());
    assert_eq!(s.value, json!({ "id": 42, "flags": { "a": true } }));
    let mut found = s.found.clone();
    found.sort();
    assert_eq!(found, ["flags", "id"]);
    assert!(s.missing.is_empty());
}

#[test]
fn embedded_tokens_are_interpolated_as_text() {
    let s = substitute_str("{{host}}/users/{{id}}?by={{name}}&again={{id}}", &stack());
    assert_eq!(s.value, "http://localhost:8080/users/42?by=alice&again=42");
    assert_eq!(s.found, ["host", "id", "name"]);
}

#[test]
fn unresolved_tokens_stay_verbatim() {
    let s = substitute_value(&json!(["{{nope}}", "x-{{nope}}-{{other}}", 3]), &stack());
    assert_eq!(s.value, json!(["{{nope}}", "x-{{nope}}-{{other}}", 3]));
    assert_eq!(s.missing, ["nope", "other"]);
}

#[test]
fn unresolved_tokens_keep_their_original_spacing() {
    let s = substitute_value(&json!(["{{ undeclared }}", "a {{ undeclared }} {{name}}"]), &stack());
    assert_eq!(s.value, json!(["{{ undeclared }}", "a {{ undeclared }} alice"]));
    assert_eq!(s.missing, ["undeclared"]);
}

#[test]
fn broken_open_brace_before_a_token_still_substitutes() {
    let s = substitute_str("{{x y {{name}}", &stack());
    assert_eq!(s.value, "{{x y alice");
    assert_eq!(s.found, ["name"]);
}

#[test]
fn malformed_braces_are_plain_text() {
    let s = substitute_str("{{ not a name }} and {{unclosed", &stack());
    assert_eq!(s.value, "{{ not a name }} and {{unclosed");
    assert!(s.found.is_empty() && s.missing.is_empty());
}

#[test]
fn request_template_fields_are_all_substituted() {
    let mut t = RequestTemplate {
        method: "post".to_string(),
        url: "{{host}}/users/{id}".to_string(),
        parameters: Default::default(),
        body: Some(RequestBody {
            media_type: None,
            value: json!({ "owner": "{{name}}", "token": "{{token}}" }),
        }),
    };
    t.parameters.path.insert("id".to_string(), json!("{{id}}"));
    t.parameters.header.insert("X-User".to_string(), json!("{{name}}"));

    let s = substitute_request(&t, &stack());
    assert_eq!(s.value.url, "http://localhost:8080/users/{id}");
    assert_eq!(s.value.parameters.path["id"], json!(42));
    assert_eq!(s.value.parameters.header["X-User"], json!("alice"));
    assert_eq!(
        s.value.body.unwrap().value,
        json!({ "owner": "alice", "token": "{{token}}" })
    );
    assert_eq!(s.missing, ["token"]);
}
