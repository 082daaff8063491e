use playbook_core::types::{Bundle, Stage};
use serde::Serialize;

use crate::env::{EnvStack, EnvStackEntry};
use crate::executor::assign::{apply_assignments, Exchange};
use crate::executor::auth::{apply_credential, AcquiredCredential};
use crate::executor::config::{ExecutorConfig, FailurePolicy};
use crate::executor::events::{Current, EventSink, StepEvent};
use crate::executor::playbooks::Playbook;
use crate::executor::request::prepare_request;
use crate::executor::resolver::{resolve, stage_label};
use crate::substitute::{substitute_map, substitute_request};
use crate::transport::Transport;

pub const STAGE_ENTRY_ID: &str = "stage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybookStatus {
    Finished,
    Aborted,
    /// Not started because an earlier playbook aborted the run.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybookOutcome {
    pub name: String,
    pub status: PlaybookStatus,
}

/// Final state of a run: the environment stack as the last stage left it and how each
/// playbook ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub stack: EnvStack,
    pub playbooks: Vec<PlaybookOutcome>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.playbooks
            .iter()
            .all(|p| p.status == PlaybookStatus::Finished)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageOutcome {
    Completed,
    Failed,
}

/// Runs playbooks stage by stage against one bundle and transport.
pub struct Interpreter<'a> {
    pub(crate) bundle: &'a Bundle,
    transport: &'a dyn Transport,
    config: &'a ExecutorConfig,
}

impl<'a> Interpreter<'a> {
    pub fn new(bundle: &'a Bundle, transport: &'a dyn Transport, config: &'a ExecutorConfig) -> Self {
        Self {
            bundle,
            transport,
            config,
        }
    }

    /// Runs `playbooks` in order over one shared stack seeded with `seed`. Every event is
    /// sent to `sink` before the next step begins.
    pub async fn execute(&self, playbooks: &[Playbook], seed: EnvStack, sink: &dyn EventSink) -> RunOutcome {
        let mut stack = seed;
        let mut outcomes = Vec::with_capacity(playbooks.len());
        let mut halted = false;
        let current = Current::default();

        for playbook in playbooks {
            if halted {
                tracing::debug!(playbook = %playbook.name, "skipping playbook after aborted run");
                outcomes.push(PlaybookOutcome {
                    name: playbook.name.clone(),
                    status: PlaybookStatus::Skipped,
                });
                continue;
            }
            let finished = self
                .run_playbook(&playbook.name, &playbook.stages, &mut stack, sink, &current)
                .await;
            outcomes.push(PlaybookOutcome {
                name: playbook.name.clone(),
                status: if finished {
                    PlaybookStatus::Finished
                } else {
                    PlaybookStatus::Aborted
                },
            });
            if !finished && self.config.failure_policy == FailurePolicy::AbortRun {
                halted = true;
            }
        }

        RunOutcome {
            stack,
            playbooks: outcomes,
        }
    }

    /// Returns `true` when every stage completed.
    pub(crate) async fn run_playbook(
        &self,
        name: &str,
        stages: &[Stage],
        stack: &mut EnvStack,
        sink: &dyn EventSink,
        current: &Current,
    ) -> bool {
        tracing::info!(playbook = name, auth = ?current.auth, stages = stages.len(), "playbook started");
        sink.emit(StepEvent::PlaybookStarted {
            name: name.to_string(),
        })
        .await;

        let mut failed = false;
        for stage in stages {
            if self.run_stage(stage, stack, sink, current).await == StageOutcome::Failed {
                failed = true;
                if self.config.failure_policy != FailurePolicy::ContinueStages {
                    break;
                }
            }
        }

        let name = name.to_string();
        if failed {
            tracing::warn!(playbook = %name, auth = ?current.auth, "playbook aborted");
            sink.emit(StepEvent::PlaybookAborted { name }).await;
        } else {
            tracing::info!(playbook = %name, auth = ?current.auth, "playbook finished");
            sink.emit(StepEvent::PlaybookFinished { name }).await;
        }
        !failed
    }

    async fn run_stage(
        &self,
        stage: &Stage,
        stack: &mut EnvStack,
        sink: &dyn EventSink,
        current: &Current,
    ) -> StageOutcome {
        let label = stage_label(stage);
        let resolved = match resolve(self.bundle, stage) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(stage = %label, error = %e, "stage did not resolve");
                sink.emit(StepEvent::RequestStarted {
                    reference: stage.request_ref().cloned(),
                })
                .await;
                sink.emit(StepEvent::HttpRequestPrepareError {
                    error: e.to_string(),
                })
                .await;
                return StageOutcome::Failed;
            }
        };

        let mut credentials: Vec<AcquiredCredential<'a>> = Vec::new();
        let mut auth_error = None;
        for auth in &resolved.content.auth {
            sink.emit(StepEvent::AuthStarted { name: auth.clone() }).await;
            match self.acquire(auth, stack, sink).await {
                Ok(acquired) => {
                    stack.extend(acquired.entries);
                    credentials.push(acquired.credential);
                }
                Err(e) => {
                    tracing::warn!(stage = %label, auth = %auth, error = %e, "credential unavailable");
                    auth_error.get_or_insert(e);
                }
            }
            sink.emit(StepEvent::AuthFinished { name: auth.clone() }).await;
        }

        sink.emit(StepEvent::RequestStarted {
            reference: stage.request_ref().cloned(),
        })
        .await;

        // Stage-level variables apply to this request only.
        let stage_env = substitute_map(stage.environment(), stack);
        let stage_stack = if stage.environment().is_empty() {
            stack.clone()
        } else {
            stack.layered(EnvStackEntry::new(STAGE_ENTRY_ID, stage_env.value))
        };
        let substituted = substitute_request(&resolved.content.request, &stage_stack);
        let mut found = stage_env.found;
        let mut missing = stage_env.missing;
        merge_names(&mut found, substituted.found);
        merge_names(&mut missing, substituted.missing);
        if !missing.is_empty() {
            tracing::debug!(stage = %label, missing = ?missing, "unresolved variables");
        }
        sink.emit(StepEvent::PayloadVariablesSubstituted {
            stack: stage_stack,
            found,
            missing,
        })
        .await;

        if let Some(e) = auth_error {
            sink.emit(StepEvent::HttpRequestPrepareError {
                error: e.to_string(),
            })
            .await;
            return StageOutcome::Failed;
        }

        let prepared = prepare_request(&substituted.value).and_then(|mut p| {
            for c in &credentials {
                apply_credential(&mut p, c)?;
            }
            Ok(p)
        });
        let request = match prepared {
            Ok(p) => p.into_http(),
            Err(e) => {
                tracing::warn!(stage = %label, error = %e, "request preparation failed");
                sink.emit(StepEvent::HttpRequestPrepareError {
                    error: e.to_string(),
                })
                .await;
                return StageOutcome::Failed;
            }
        };
        sink.emit(StepEvent::HttpRequestPrepared {
            request: request.clone(),
            operation_id: resolved.operation_id.map(str::to_string),
        })
        .await;

        tracing::debug!(stage = %label, method = %request.method, url = %request.url, "sending request");
        let response = match self.transport.send(request.clone()).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(stage = %label, error = %e, "transport error");
                sink.emit(StepEvent::HttpErrorReceived { error: e }).await;
                return StageOutcome::Failed;
            }
        };
        tracing::debug!(stage = %label, status = response.status, "response received");
        sink.emit(StepEvent::HttpResponseReceived {
            response: response.clone(),
        })
        .await;

        let rules = resolved
            .content
            .response_for(response.status)
            .map(|r| r.variable_assignments.as_slice())
            .unwrap_or_default();
        if rules.is_empty() {
            return StageOutcome::Completed;
        }
        let exchange = Exchange {
            template: &substituted.value,
            request: &request,
            response: &response,
        };
        let (entry, errors) = apply_assignments(&label, rules, &exchange);
        if let Some(entry) = entry {
            stack.push(entry.clone());
            sink.emit(StepEvent::VariablesAssigned { assignments: entry })
                .await;
        }
        for (name, e) in errors {
            tracing::debug!(stage = %label, variable = %name, error = %e, "assignment failed");
            sink.emit(StepEvent::VariablesAssignmentError {
                name,
                error: e.to_string(),
            })
            .await;
        }
        StageOutcome::Completed
    }
}

fn merge_names(into: &mut Vec<String>, names: Vec<String>) {
    for n in names {
        if !into.contains(&n) {
            into.push(n);
        }
    }
}
