use std::collections::BTreeSet;

use crate::types::Bundle;
use crate::validate::rules::{
    common::{validate_ids, validate_variable_name},
    content::validate_stage_content,
    credentials::{validate_credential, validate_no_cycles},
    stages::validate_stage_list,
};
use crate::validate::validator::Validator;

pub(crate) fn validate_bundle(v: &mut Validator, bundle: &Bundle) {
    validate_ids(v, "$.operations", bundle.operations.keys());
    validate_ids(v, "$.requests", bundle.requests.keys());

    for (id, op) in &bundle.operations {
        let path = format!("$.operations.{id}");
        if &op.operation_id != id {
            v.push(
                format!("{path}.operationId"),
                format!("must match its key '{id}'"),
            );
        }
        validate_stage_content(v, bundle, &op.request, &format!("{path}.request"));

        let mut keys = BTreeSet::new();
        for (idx, sc) in op.scenarios.iter().enumerate() {
            if !keys.insert(sc.key.as_str()) {
                v.push(
                    format!("{path}.scenarios[{idx}].key"),
                    format!("duplicate scenario key '{}'", sc.key),
                );
            }
        }
        for test in &op.authorization_tests {
            if !bundle.authorization_tests.contains_key(test) {
                v.push(
                    format!("{path}.authorizationTests"),
                    format!("unknown authorization test '{test}'"),
                );
            }
        }
    }

    for (id, content) in &bundle.requests {
        validate_stage_content(v, bundle, content, &format!("$.requests.{id}"));
    }

    let mut seen = BTreeSet::new();
    for (gidx, group) in bundle.authentication_details.iter().enumerate() {
        for (name, cred) in group {
            let path = format!("$.authenticationDetails[{gidx}].{name}");
            if !seen.insert(name.as_str()) {
                v.push(&path, format!("credential '{name}' is declared more than once"));
            }
            validate_credential(v, name, cred, &path);
        }
    }
    validate_no_cycles(v, bundle);

    for (path, stages) in bundle.stage_lists() {
        validate_stage_list(v, bundle, stages, &path);
    }

    for (env_name, env) in &bundle.environments {
        for name in env.variables.keys() {
            validate_variable_name(
                v,
                &format!("$.environments.{env_name}.variables.{name}"),
                name,
            );
        }
    }

    for (key, test) in &bundle.authorization_tests {
        for name in test.source.iter().chain(test.target.iter()) {
            if !bundle.has_credential(name) {
                v.push(
                    format!("$.authorizationTests.{key}"),
                    format!("unknown credential '{name}'"),
                );
            }
        }
    }
}
