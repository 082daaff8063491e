use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use playbook_core::{load_bundle_str, Bundle, BundleError, BundleFormat};
use playbook_exec::transport::{MockTransport, ReqwestTransport, ReqwestTransportConfig};
use playbook_exec::{build_seed, EnvStack, ExecutorConfig, HttpResponse, Transport};
use serde_json::Value as JsonValue;

use crate::exit_codes;
use crate::output::print_error;
use crate::{EnvArgs, ExecArgs, OutputArgs, TransportArgs};

/// Reads, parses and validates a bundle. On failure the error is printed and the exit
/// code to return is handed back.
pub fn read_bundle(path: &Path, output: &OutputArgs) -> Result<Bundle, i32> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        print_error(
            output.format,
            output.quiet,
            &format!("failed to read {}: {e}", path.display()),
        );
        exit_codes::RUNTIME_ERROR
    })?;

    match load_bundle_str(&content, BundleFormat::Auto) {
        Ok(parsed) => Ok(parsed.bundle),
        Err(BundleError::Validation(err)) => {
            print_error(output.format, output.quiet, &err.to_string());
            for v in &err.violations {
                print_error(output.format, output.quiet, &v.to_string());
            }
            Err(exit_codes::SETUP_FAILED)
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            Err(exit_codes::SETUP_FAILED)
        }
    }
}

pub fn load_inputs(path: Option<&Path>, output: &OutputArgs) -> Option<JsonValue> {
    let path = path?;
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to read inputs: {e}"));
            return None;
        }
    };
    if let Ok(v) = serde_json::from_str(&content) {
        return Some(v);
    }
    if let Ok(v) = serde_yaml::from_str(&content) {
        return Some(v);
    }
    print_error(output.format, output.quiet, "inputs file is neither valid JSON nor YAML");
    None
}

/// Layers `--set KEY=VALUE` pairs over the inputs file. An argument without `=` or
/// with an empty key is rejected and nothing is merged.
pub fn merge_set_inputs(inputs: &mut Option<JsonValue>, set_inputs: &[String]) -> Result<(), String> {
    let pairs = set_inputs
        .iter()
        .map(|s| match s.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim(), v)),
            _ => Err(format!("invalid --set argument '{s}': expected KEY=VALUE")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if pairs.is_empty() {
        return Ok(());
    }
    let obj = inputs.get_or_insert(serde_json::json!({}));
    let Some(map) = obj.as_object_mut() else {
        return Err("--set needs the inputs file to hold an object".to_string());
    };
    for (k, v) in pairs {
        map.insert(k.to_string(), JsonValue::String(v.to_string()));
    }
    Ok(())
}

/// Parses `KEY=VALUE` lines. Blank lines and `#` comments are skipped and surrounding
/// quotes are removed from values.
pub fn parse_env_file(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| {
            let v = v.trim();
            let v = v
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .or_else(|| v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
                .unwrap_or(v);
            (k.trim().to_string(), v.to_string())
        })
        .collect()
}

/// Builds the seed stack from process variables, the env file and user inputs.
pub fn build_stack(bundle: &Bundle, env: &EnvArgs, output: &OutputArgs) -> Result<EnvStack, i32> {
    let mut external: BTreeMap<String, String> = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    if let Some(path) = &env.env_file {
        let content = std::fs::read_to_string(path).map_err(|e| {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            exit_codes::RUNTIME_ERROR
        })?;
        external.extend(parse_env_file(&content));
    }

    let mut inputs = load_inputs(env.inputs.as_deref(), output);
    if inputs.is_none() && env.inputs.is_some() {
        return Err(exit_codes::RUNTIME_ERROR);
    }
    if let Err(e) = merge_set_inputs(&mut inputs, &env.set_inputs) {
        print_error(output.format, output.quiet, &e);
        return Err(exit_codes::SETUP_FAILED);
    }
    let inputs: BTreeMap<String, JsonValue> = match inputs {
        None => BTreeMap::new(),
        Some(JsonValue::Object(map)) => map.into_iter().collect(),
        Some(_) => {
            print_error(output.format, output.quiet, "inputs must be an object");
            return Err(exit_codes::SETUP_FAILED);
        }
    };

    build_seed(bundle, env.env.as_deref(), &external, inputs).map_err(|e| {
        print_error(output.format, output.quiet, &e.to_string());
        exit_codes::SETUP_FAILED
    })
}

pub fn build_transport(args: &TransportArgs, output: &OutputArgs) -> Result<Arc<dyn Transport>, i32> {
    if !args.live {
        let response = HttpResponse::new(args.mock_status).with_body(args.mock_body.clone());
        return Ok(Arc::new(MockTransport::new(response)));
    }
    let config = ReqwestTransportConfig {
        timeout: Duration::from_millis(args.timeout),
        max_response_bytes: args.max_response_bytes,
    };
    match ReqwestTransport::new(config) {
        Ok(t) => Ok(Arc::new(t)),
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            Err(exit_codes::RUNTIME_ERROR)
        }
    }
}

pub fn build_executor_config(exec: &ExecArgs) -> ExecutorConfig {
    ExecutorConfig {
        failure_policy: exec.failure_policy,
    }
}
