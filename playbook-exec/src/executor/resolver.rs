use playbook_core::types::{Bundle, RequestRef, Stage, StageContent};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("stage not found: operation '{0}'")]
    Operation(String),
    #[error("stage not found: request '{0}'")]
    Request(String),
    #[error("stage not found: credential '{0}'")]
    Credential(String),
    #[error("stage not found: credential '{credential}' has no method '{method}'")]
    Method { credential: String, method: String },
    #[error("stage not found: credential '{credential}' method '{method}' has no stage at position {position}")]
    Position {
        credential: String,
        method: String,
        position: usize,
    },
    #[error("stage not found: {0} points at another credential stage")]
    NestedCredential(String),
    #[error("scenario not found: operation '{operation}' has no scenario '{scenario}'")]
    Scenario { operation: String, scenario: String },
}

/// The content a stage executes, borrowed from the bundle.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedStage<'b> {
    pub content: &'b StageContent,
    pub operation_id: Option<&'b str>,
}

pub fn resolve<'b>(bundle: &'b Bundle, stage: &'b Stage) -> Result<ResolvedStage<'b>, ResolveError> {
    match stage {
        Stage::External(e) => Ok(ResolvedStage {
            content: &e.content,
            operation_id: e.content.operation_id.as_deref(),
        }),
        Stage::Reference(r) => resolve_ref(bundle, &r.reference),
    }
}

pub fn resolve_ref<'b>(
    bundle: &'b Bundle,
    reference: &RequestRef,
) -> Result<ResolvedStage<'b>, ResolveError> {
    match reference {
        RequestRef::Operation { id } => {
            let op = bundle
                .operations
                .get(id)
                .ok_or_else(|| ResolveError::Operation(id.clone()))?;
            Ok(ResolvedStage {
                content: &op.request,
                operation_id: Some(
                    op.request
                        .operation_id
                        .as_deref()
                        .unwrap_or(op.operation_id.as_str()),
                ),
            })
        }
        RequestRef::Request { id } => {
            let content = bundle
                .requests
                .get(id)
                .ok_or_else(|| ResolveError::Request(id.clone()))?;
            Ok(ResolvedStage {
                content,
                operation_id: content.operation_id.as_deref(),
            })
        }
        RequestRef::Credential {
            id,
            method,
            position,
        } => {
            let cred = bundle
                .credential(id)
                .ok_or_else(|| ResolveError::Credential(id.clone()))?;
            let (method_name, m) =
                cred.method(method.as_deref())
                    .ok_or_else(|| ResolveError::Method {
                        credential: id.clone(),
                        method: method.clone().unwrap_or_else(|| cred.default.clone()),
                    })?;
            let stage = m.requests.get(*position).ok_or_else(|| ResolveError::Position {
                credential: id.clone(),
                method: method_name.to_string(),
                position: *position,
            })?;
            match stage {
                Stage::Reference(r) if matches!(r.reference, RequestRef::Credential { .. }) => {
                    Err(ResolveError::NestedCredential(reference.to_string()))
                }
                other => resolve(bundle, other),
            }
        }
    }
}

/// Human label for a stage: its reference, else its operation id.
pub fn stage_label(stage: &Stage) -> String {
    match stage {
        Stage::Reference(r) => r.reference.to_string(),
        Stage::External(e) => e
            .content
            .operation_id
            .clone()
            .map(|id| format!("external:{id}"))
            .unwrap_or_else(|| "external".to_string()),
    }
}
