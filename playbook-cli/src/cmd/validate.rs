use std::path::Path;

use playbook_core::{parse_bundle_str, BundleFormat, Validate};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    format: String,
    operations: usize,
    requests: usize,
    credentials: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(path: &Path, output: OutputArgs) -> i32 {
    let content = match std::fs::read_to_string(path) {
        Ok(v) => v,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let parsed = match parse_bundle_str(&content, BundleFormat::Auto) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::SETUP_FAILED;
        }
    };

    let bundle = &parsed.bundle;
    let mut result = ValidateResult {
        valid: true,
        format: format!("{:?}", parsed.format),
        operations: bundle.operations.len(),
        requests: bundle.requests.len(),
        credentials: bundle.credential_names().count(),
        errors: vec![],
    };

    match bundle.validate() {
        Ok(()) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!(
                    "ok: valid playbook bundle ({:?}, {} operations, {} requests, {} credentials)",
                    parsed.format, result.operations, result.requests, result.credentials
                );
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(err) => {
            result.valid = false;
            result.errors = err
                .violations
                .iter()
                .map(ToString::to_string)
                .collect();
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("error: validation failed");
                for e in &result.errors {
                    eprintln!("- {e}");
                }
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SETUP_FAILED
        }
    }
}
