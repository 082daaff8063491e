use base64::Engine as _;
use futures_util::future::{BoxFuture, FutureExt};
use playbook_core::types::{AuthRef, Credential, CredentialLocation, CredentialType};
use serde_json::Value as JsonValue;

use crate::env::{EnvStack, EnvStackEntry};
use crate::executor::events::{Current, EventSink};
use crate::executor::interpreter::Interpreter;
use crate::executor::request::{PrepareError, PreparedRequest};
use crate::substitute::substitute_str;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("unknown credential '{0}'")]
    UnknownCredential(String),
    #[error("credential '{credential}' has no method '{method}'")]
    UnknownMethod { credential: String, method: String },
}

/// A resolved credential value ready to be placed on a request.
#[derive(Debug, Clone)]
pub struct AcquiredCredential<'b> {
    pub name: String,
    pub credential: &'b Credential,
    pub value: String,
}

/// Result of one acquisition: the value and the stack entries the nested run produced,
/// in push order. The caller pushes them.
#[derive(Debug, Clone)]
pub struct Acquisition<'b> {
    pub credential: AcquiredCredential<'b>,
    pub entries: Vec<EnvStackEntry>,
}

impl<'a> Interpreter<'a> {
    /// Resolves one `auth` entry (`name` or `name/method`) against `stack`.
    ///
    /// The method's acquisition stages run as a nested playbook named after the
    /// credential, seeded with a copy of `stack`. Its events go straight to `sink` as they
    /// happen; `Current` marks them as nested. The credential template is then
    /// substituted against the nested result and recorded as an `auth:<name>` entry.
    /// Nothing is cached: every requirement triggers a fresh acquisition.
    pub(crate) fn acquire<'s>(
        &'s self,
        auth: &'s str,
        stack: &'s EnvStack,
        sink: &'s dyn EventSink,
    ) -> BoxFuture<'s, Result<Acquisition<'a>, AuthError>> {
        async move {
            let r = AuthRef::parse(auth);
            let credential = self
                .bundle
                .credential(r.name)
                .ok_or_else(|| AuthError::UnknownCredential(r.name.to_string()))?;
            let (method_name, method) =
                credential
                    .method(r.method)
                    .ok_or_else(|| AuthError::UnknownMethod {
                        credential: r.name.to_string(),
                        method: r.method.unwrap_or(&credential.default).to_string(),
                    })?;

            let mut nested = stack.clone();
            if !method.requests.is_empty() {
                tracing::debug!(credential = r.name, method = method_name, "acquiring credential");
                let current = Current::in_auth(r.name);
                let finished = self
                    .run_playbook(r.name, &method.requests, &mut nested, sink, &current)
                    .await;
                if !finished {
                    tracing::warn!(credential = r.name, method = method_name, "credential acquisition aborted");
                }
            }

            let value = substitute_str(&method.credential, &nested);
            if !value.missing.is_empty() {
                tracing::warn!(credential = r.name, missing = ?value.missing, "credential has unresolved variables");
            }
            nested.push(EnvStackEntry::new(
                format!("auth:{}", r.name),
                [(r.name.to_string(), JsonValue::String(value.value.clone()))].into(),
            ));

            Ok(Acquisition {
                credential: AcquiredCredential {
                    name: r.name.to_string(),
                    credential,
                    value: value.value,
                },
                entries: nested.entries_since(stack.len()).to_vec(),
            })
        }
        .boxed()
    }
}

/// Places a credential value on a prepared request according to its scheme.
pub fn apply_credential(request: &mut PreparedRequest, acquired: &AcquiredCredential<'_>) -> Result<(), PrepareError> {
    let value = acquired.value.as_str();
    match acquired.credential.kind {
        CredentialType::ApiKey => {
            let name = acquired
                .credential
                .name
                .as_deref()
                .ok_or_else(|| PrepareError::CredentialName(acquired.name.clone()))?;
            match acquired.credential.location.unwrap_or(CredentialLocation::Header) {
                CredentialLocation::Header => request.set_header(name, value),
                CredentialLocation::Query => request.append_query(name, value),
                CredentialLocation::Cookie => request.append_cookie(name, value),
            }
        }
        CredentialType::Bearer | CredentialType::Oauth2 => {
            request.set_header("Authorization", format!("Bearer {value}"));
        }
        CredentialType::Basic => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(value);
            request.set_header("Authorization", format!("Basic {encoded}"));
        }
    }
    Ok(())
}
