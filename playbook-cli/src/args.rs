use std::path::PathBuf;

use clap::Args;
use playbook_exec::FailurePolicy;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct EnvArgs {
    /// Bundle environment to seed from (defaults to `default` when declared).
    #[arg(long)]
    pub env: Option<String>,
    /// KEY=VALUE lines overriding process environment variables.
    #[arg(long)]
    pub env_file: Option<PathBuf>,
    /// JSON or YAML object of user inputs.
    #[arg(long)]
    pub inputs: Option<PathBuf>,
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set_inputs: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TransportArgs {
    /// Send real HTTP requests instead of answering with the mock response.
    #[arg(long)]
    pub live: bool,
    #[arg(long, default_value_t = 200)]
    pub mock_status: u16,
    #[arg(long, default_value = "")]
    pub mock_body: String,
    /// Live request timeout in milliseconds.
    #[arg(long, default_value_t = 30000)]
    pub timeout: u64,
    #[arg(long, default_value_t = 10_485_760)]
    pub max_response_bytes: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExecArgs {
    #[arg(long, default_value_t = FailurePolicy::AbortPlaybook)]
    pub failure_policy: FailurePolicy,
}
