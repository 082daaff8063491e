use std::path::Path;
use std::sync::Arc;

use playbook_core::Bundle;
use playbook_exec::executor::{CollectingEventSink, NoOpEventSink, ResolveError, StdoutEventSink};
use playbook_exec::{scenario_playbooks, Executor, Playbook, RunReport};

use crate::cmd::config::{build_executor_config, build_stack, build_transport, read_bundle};
use crate::cmd::render::render_report;
use crate::exit_codes;
use crate::output::{print_error, OutputFormat};
use crate::{EnvArgs, ExecArgs, OutputArgs, TransportArgs};

pub async fn run_cmd(
    path: &Path,
    operation: &str,
    scenario: Option<&str>,
    env: EnvArgs,
    transport: TransportArgs,
    exec: ExecArgs,
    output: OutputArgs,
) -> i32 {
    let bundle = match read_bundle(path, &output) {
        Ok(b) => b,
        Err(code) => return code,
    };
    let playbooks = scenario_playbooks(&bundle, operation, scenario);
    execute_playbooks(bundle, playbooks, &env, &transport, &exec, &output).await
}

/// Seeds the stack, runs the playbooks and reports. JSON output streams every event as
/// it happens; text output prints a summary once the run is over.
pub async fn execute_playbooks(
    bundle: Bundle,
    playbooks: Result<Vec<Playbook>, ResolveError>,
    env: &EnvArgs,
    transport: &TransportArgs,
    exec: &ExecArgs,
    output: &OutputArgs,
) -> i32 {
    let playbooks = match playbooks {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::SETUP_FAILED;
        }
    };
    let seed = match build_stack(&bundle, env, output) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sender = match build_transport(transport, output) {
        Ok(t) => t,
        Err(code) => return code,
    };

    tracing::info!(playbooks = playbooks.len(), live = transport.live, "starting run");
    let executor = Executor::new(Arc::new(bundle), sender, build_executor_config(exec));

    let succeeded = match (output.format, output.quiet) {
        (_, true) => {
            let sink = NoOpEventSink;
            executor.execute(&playbooks, seed, &sink).await.succeeded()
        }
        (OutputFormat::Json, false) => {
            let sink = StdoutEventSink;
            executor.execute(&playbooks, seed, &sink).await.succeeded()
        }
        (OutputFormat::Text, false) => {
            let sink = CollectingEventSink::new();
            let outcome = executor.execute(&playbooks, seed, &sink).await;
            let report = RunReport::from_events(&sink.into_events());
            print!("{}", render_report(&report));
            outcome.succeeded()
        }
    };

    if succeeded {
        exit_codes::SUCCESS
    } else {
        exit_codes::PLAYBOOK_ABORTED
    }
}
