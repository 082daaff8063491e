#![forbid(unsafe_code)]

//! Runtime engine for playbook bundles: environment stack, variable substitution,
//! transports and the stage interpreter.

pub mod env;
pub mod executor;
pub mod substitute;
pub mod transport;

pub use crate::env::{build_seed, EnvStack, EnvStackEntry, SeedError};
pub use crate::executor::{
    request_playbooks, scenario_playbooks, EventSink, Executor, ExecutorConfig, FailurePolicy,
    Interpreter, Playbook, RunOutcome, RunReport, StepEvent,
};
pub use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
