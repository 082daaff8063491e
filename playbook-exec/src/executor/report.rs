//! Folds a step event stream into a nested summary, the way a UI would build its view.

use playbook_core::types::RequestRef;
use serde::Serialize;

use crate::env::EnvStackEntry;
use crate::executor::events::{Current, StepEvent};
use crate::transport::{HttpRequest, HttpResponse, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Running,
    Finished,
    Aborted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub playbooks: Vec<PlaybookReport>,
    #[serde(skip)]
    current: Current,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybookReport {
    pub name: String,
    pub status: ReportStatus,
    pub requests: Vec<RequestReport>,
    /// Credentials acquired for a request that has not started yet.
    #[serde(skip)]
    pending_auth: Vec<AuthReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReport {
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<RequestRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auth: Vec<AuthReport>,
    pub found: Vec<String>,
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<HttpRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepare_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TransportError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assigned: Vec<EnvStackEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignment_errors: Vec<AssignmentErrorReport>,
}

impl RequestReport {
    /// A request failed when it never produced a response.
    pub fn failed(&self) -> bool {
        self.prepare_error.is_some() || self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentErrorReport {
    pub name: String,
    pub error: String,
}

/// Everything that happened while acquiring one credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthReport {
    pub name: String,
    pub finished: bool,
    pub run: RunReport,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'e>(events: impl IntoIterator<Item = &'e StepEvent>) -> Self {
        events.into_iter().fold(Self::new(), fold)
    }

    pub fn succeeded(&self) -> bool {
        self.playbooks
            .iter()
            .all(|p| p.status == ReportStatus::Finished)
    }

    pub fn apply(&mut self, event: &StepEvent) {
        if let Some(open) = self.current.auth.clone() {
            let Some(auth) = self.open_auth() else {
                self.current.auth = None;
                return self.apply(event);
            };
            let closes_here = auth.run.current.auth.is_none()
                && matches!(event, StepEvent::AuthFinished { name } if *name == open);
            if closes_here {
                auth.finished = true;
                self.current.auth = None;
            } else {
                auth.run.apply(event);
            }
            return;
        }

        match event {
            StepEvent::PlaybookStarted { name } => self.playbooks.push(PlaybookReport {
                name: name.clone(),
                status: ReportStatus::Running,
                requests: Vec::new(),
                pending_auth: Vec::new(),
            }),
            StepEvent::AuthStarted { name } => {
                if let Some(p) = self.playbooks.last_mut() {
                    p.pending_auth.push(AuthReport {
                        name: name.clone(),
                        finished: false,
                        run: RunReport::new(),
                    });
                    self.current.auth = Some(name.clone());
                }
            }
            StepEvent::AuthFinished { .. } => {}
            StepEvent::RequestStarted { reference } => {
                if let Some(p) = self.playbooks.last_mut() {
                    p.requests.push(RequestReport {
                        reference: reference.clone(),
                        auth: std::mem::take(&mut p.pending_auth),
                        ..RequestReport::default()
                    });
                }
            }
            StepEvent::PayloadVariablesSubstituted { found, missing, .. } => {
                if let Some(r) = self.last_request() {
                    r.found = found.clone();
                    r.missing = missing.clone();
                }
            }
            StepEvent::HttpRequestPrepared {
                request,
                operation_id,
            } => {
                if let Some(r) = self.last_request() {
                    r.request = Some(request.clone());
                    r.operation_id = operation_id.clone();
                }
            }
            StepEvent::HttpRequestPrepareError { error } => {
                if let Some(r) = self.last_request() {
                    r.prepare_error = Some(error.clone());
                }
            }
            StepEvent::HttpResponseReceived { response } => {
                if let Some(r) = self.last_request() {
                    r.response = Some(response.clone());
                }
            }
            StepEvent::HttpErrorReceived { error } => {
                if let Some(r) = self.last_request() {
                    r.error = Some(error.clone());
                }
            }
            StepEvent::VariablesAssigned { assignments } => {
                if let Some(r) = self.last_request() {
                    r.assigned.push(assignments.clone());
                }
            }
            StepEvent::VariablesAssignmentError { name, error } => {
                if let Some(r) = self.last_request() {
                    r.assignment_errors.push(AssignmentErrorReport {
                        name: name.clone(),
                        error: error.clone(),
                    });
                }
            }
            StepEvent::PlaybookFinished { .. } => self.set_status(ReportStatus::Finished),
            StepEvent::PlaybookAborted { .. } => self.set_status(ReportStatus::Aborted),
        }
    }

    fn open_auth(&mut self) -> Option<&mut AuthReport> {
        self.playbooks.last_mut()?.pending_auth.last_mut()
    }

    fn last_request(&mut self) -> Option<&mut RequestReport> {
        self.playbooks.last_mut()?.requests.last_mut()
    }

    fn set_status(&mut self, status: ReportStatus) {
        if let Some(p) = self.playbooks.last_mut() {
            p.status = status;
        }
    }
}

/// Pure fold step: `state` plus one event gives the next state.
pub fn fold(mut state: RunReport, event: &StepEvent) -> RunReport {
    state.apply(event);
    state
}
