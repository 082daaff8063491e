use std::collections::{BTreeMap, BTreeSet};

use crate::types::{AuthRef, Bundle, Credential, CredentialLocation, CredentialType, RequestRef, Stage};
use crate::validate::validator::Validator;

pub(crate) fn validate_credential(v: &mut Validator, name: &str, cred: &Credential, path: &str) {
    if !cred.methods.contains_key(&cred.default) {
        v.push(
            format!("{path}.default"),
            format!("default method '{}' is not declared for '{name}'", cred.default),
        );
    }
    if cred.kind == CredentialType::ApiKey {
        if cred.name.as_deref().unwrap_or("").is_empty() {
            v.push(format!("{path}.name"), "apiKey credentials need a name");
        }
        if cred.location.is_none() {
            v.push(format!("{path}.in"), "apiKey credentials need a location");
        }
    }
    if matches!(cred.kind, CredentialType::Bearer | CredentialType::Oauth2 | CredentialType::Basic)
        && matches!(cred.location, Some(CredentialLocation::Query | CredentialLocation::Cookie))
    {
        v.push(
            format!("{path}.in"),
            "only apiKey credentials may be placed in query or cookie",
        );
    }
}

/// Reports credentials whose acquisition stages (transitively) require themselves.
pub(crate) fn validate_no_cycles(v: &mut Validator, bundle: &Bundle) {
    let graph = dependency_graph(bundle);
    let mut done = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for name in graph.keys() {
        let mut trail = Vec::new();
        visit(*name, &graph, &mut trail, &mut done, &mut reported, v);
    }
}

fn visit<'a>(
    name: &'a str,
    graph: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    trail: &mut Vec<&'a str>,
    done: &mut BTreeSet<&'a str>,
    reported: &mut BTreeSet<&'a str>,
    v: &mut Validator,
) {
    if done.contains(name) {
        return;
    }
    if let Some(pos) = trail.iter().position(|n| *n == name) {
        if reported.insert(name) {
            let mut cycle: Vec<&str> = trail[pos..].to_vec();
            cycle.push(name);
            v.push(
                format!("$.authenticationDetails.{name}"),
                format!("credential acquisition cycle: {}", cycle.join(" -> ")),
            );
        }
        return;
    }
    trail.push(name);
    if let Some(deps) = graph.get(name) {
        for dep in deps {
            visit(*dep, graph, trail, done, reported, v);
        }
    }
    trail.pop();
    done.insert(name);
}

fn dependency_graph(bundle: &Bundle) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut graph = BTreeMap::new();
    for group in &bundle.authentication_details {
        for (name, cred) in group {
            let deps: &mut BTreeSet<&str> = graph.entry(name.as_str()).or_default();
            for method in cred.methods.values() {
                for stage in &method.requests {
                    for auth in stage_auth(bundle, stage) {
                        deps.insert(AuthRef::parse(auth).name);
                    }
                }
            }
        }
    }
    graph
}

fn stage_auth<'b>(bundle: &'b Bundle, stage: &'b Stage) -> &'b [String] {
    match stage {
        Stage::External(e) => &e.content.auth,
        Stage::Reference(r) => match &r.reference {
            RequestRef::Operation { id } => bundle
                .operations
                .get(id)
                .map(|op| op.request.auth.as_slice())
                .unwrap_or(&[]),
            RequestRef::Request { id } => bundle
                .requests
                .get(id)
                .map(|c| c.auth.as_slice())
                .unwrap_or(&[]),
            RequestRef::Credential {
                id,
                method,
                position,
            } => bundle
                .credential(id)
                .and_then(|c| c.method(method.as_deref()))
                .and_then(|(_, m)| m.requests.get(*position))
                .map(|s| match s {
                    Stage::External(e) => e.content.auth.as_slice(),
                    Stage::Reference(_) => &[],
                })
                .unwrap_or(&[]),
        },
    }
}
