use std::path::Path;

use playbook_core::types::RequestRef;
use playbook_exec::request_playbooks;

use crate::cmd::config::read_bundle;
use crate::cmd::run::execute_playbooks;
use crate::exit_codes;
use crate::output::print_error;
use crate::{EnvArgs, ExecArgs, OutputArgs, TransportArgs};

pub async fn try_cmd(
    path: &Path,
    operation: Option<&str>,
    request: Option<&str>,
    env: EnvArgs,
    transport: TransportArgs,
    exec: ExecArgs,
    output: OutputArgs,
) -> i32 {
    let reference = match (operation, request) {
        (Some(id), None) => RequestRef::operation(id),
        (None, Some(id)) => RequestRef::request(id),
        _ => {
            print_error(
                output.format,
                output.quiet,
                "exactly one of --operation or --request is required",
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let bundle = match read_bundle(path, &output) {
        Ok(b) => b,
        Err(code) => return code,
    };
    let playbooks = request_playbooks(&bundle, reference);
    execute_playbooks(bundle, playbooks, &env, &transport, &exec, &output).await
}
