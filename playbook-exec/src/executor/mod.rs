mod assign;
mod auth;
mod config;
pub mod events;
#[allow(clippy::module_inception)]
mod executor;
mod interpreter;
mod playbooks;
pub mod report;
mod request;
mod resolver;

pub use assign::{apply_assignments, evaluate, AssignmentError, Exchange};
pub use auth::{apply_credential, AcquiredCredential, Acquisition, AuthError};
pub use config::{ExecutorConfig, FailurePolicy};
pub use events::{
    ChannelEventSink, CollectingEventSink, CompositeEventSink, Current, EventSink, NoOpEventSink,
    StdoutEventSink, StepEvent,
};
pub use executor::Executor;
pub use interpreter::{Interpreter, PlaybookOutcome, PlaybookStatus, RunOutcome, STAGE_ENTRY_ID};
pub use playbooks::{
    request_playbooks, scenario_playbooks, Playbook, AFTER, BEFORE, GLOBAL_AFTER, GLOBAL_BEFORE,
    REQUEST, SCENARIO,
};
pub use report::{fold, RunReport};
pub use request::{prepare_request, PrepareError, PreparedRequest};
pub use resolver::{resolve, resolve_ref, stage_label, ResolveError, ResolvedStage};
