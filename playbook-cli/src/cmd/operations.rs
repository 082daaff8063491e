use std::path::Path;

use serde::Serialize;

use crate::cmd::config::read_bundle;
use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct ScenarioInfo {
    key: String,
    stage_count: usize,
}

#[derive(Serialize)]
struct OperationInfo {
    operation_id: String,
    method: String,
    url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    auth: Vec<String>,
    scenarios: Vec<ScenarioInfo>,
}

#[derive(Serialize)]
struct OperationsResult {
    operations: Vec<OperationInfo>,
    requests: Vec<String>,
}

pub async fn operations_cmd(path: &Path, output: OutputArgs) -> i32 {
    let bundle = match read_bundle(path, &output) {
        Ok(b) => b,
        Err(code) => return code,
    };

    let operations: Vec<OperationInfo> = bundle
        .operations
        .values()
        .map(|op| OperationInfo {
            operation_id: op.operation_id.clone(),
            method: op.request.request.method.to_ascii_uppercase(),
            url: op.request.request.url.clone(),
            auth: op.request.auth.clone(),
            scenarios: op
                .scenarios
                .iter()
                .map(|s| ScenarioInfo {
                    key: s.key.clone(),
                    stage_count: s.requests.len(),
                })
                .collect(),
        })
        .collect();
    let result = OperationsResult {
        operations,
        requests: bundle.requests.keys().cloned().collect(),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Operations in {}:", path.display());
        for op in &result.operations {
            println!("  - {} ({} {})", op.operation_id, op.method, op.url);
            for s in &op.scenarios {
                println!("      scenario {} ({} stages)", s.key, s.stage_count);
            }
        }
        if !result.requests.is_empty() {
            println!("Requests: {}", result.requests.join(", "));
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
