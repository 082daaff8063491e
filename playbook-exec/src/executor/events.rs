use async_trait::async_trait;
use playbook_core::types::RequestRef;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

use crate::env::{EnvStack, EnvStackEntry};
use crate::transport::{HttpRequest, HttpResponse, TransportError};

/// Progress of a run, in execution order. Nested credential acquisition appears between
/// `AuthStarted` and `AuthFinished` carrying the same name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum StepEvent {
    PlaybookStarted {
        name: String,
    },
    RequestStarted {
        #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
        reference: Option<RequestRef>,
    },
    AuthStarted {
        name: String,
    },
    AuthFinished {
        name: String,
    },
    PayloadVariablesSubstituted {
        stack: EnvStack,
        found: Vec<String>,
        missing: Vec<String>,
    },
    HttpRequestPrepared {
        request: HttpRequest,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation_id: Option<String>,
    },
    HttpRequestPrepareError {
        error: String,
    },
    HttpResponseReceived {
        response: HttpResponse,
    },
    HttpErrorReceived {
        error: TransportError,
    },
    VariablesAssigned {
        assignments: EnvStackEntry,
    },
    VariablesAssignmentError {
        name: String,
        error: String,
    },
    PlaybookFinished {
        name: String,
    },
    PlaybookAborted {
        name: String,
    },
}

impl StepEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StepEvent::PlaybookStarted { .. } => "playbook-started",
            StepEvent::RequestStarted { .. } => "request-started",
            StepEvent::AuthStarted { .. } => "auth-started",
            StepEvent::AuthFinished { .. } => "auth-finished",
            StepEvent::PayloadVariablesSubstituted { .. } => "payload-variables-substituted",
            StepEvent::HttpRequestPrepared { .. } => "http-request-prepared",
            StepEvent::HttpRequestPrepareError { .. } => "http-request-prepare-error",
            StepEvent::HttpResponseReceived { .. } => "http-response-received",
            StepEvent::HttpErrorReceived { .. } => "http-error-received",
            StepEvent::VariablesAssigned { .. } => "variables-assigned",
            StepEvent::VariablesAssignmentError { .. } => "variables-assignment-error",
            StepEvent::PlaybookFinished { .. } => "playbook-finished",
            StepEvent::PlaybookAborted { .. } => "playbook-aborted",
        }
    }
}

/// Where the interpreter currently is with respect to credential acquisition. Threaded
/// through nested runs explicitly; consumers folding the event stream keep their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Current {
    pub auth: Option<String>,
}

impl Current {
    pub fn in_auth(name: &str) -> Self {
        Self {
            auth: Some(name.to_string()),
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: StepEvent);
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: StepEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: StepEvent) {}
}

/// Prints each event as one JSON line on stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: StepEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, kind = event.kind(), "failed to serialize event"),
        }
    }
}

/// Buffers events in memory for a summary after the run.
#[derive(Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<StepEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<StepEvent> {
        self.events.lock().await.clone()
    }

    pub fn into_events(self) -> Vec<StepEvent> {
        self.events.into_inner()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: StepEvent) {
        self.events.lock().await.push(event);
    }
}

/// Forwards events into a tokio channel; a closed receiver drops them silently.
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<StepEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<StepEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn emit(&self, event: StepEvent) {
        let _ = self.tx.send(event);
    }
}
