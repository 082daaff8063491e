use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate a playbook bundle.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List operations and their scenarios.
    Operations {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run one operation scenario wrapped in the bundle's before/after playbooks.
    Run {
        path: PathBuf,
        #[arg(long)]
        operation: String,
        /// Scenario key; the first scenario when omitted.
        #[arg(long)]
        scenario: Option<String>,
        #[command(flatten)]
        env: EnvArgs,
        #[command(flatten)]
        transport: TransportArgs,
        #[command(flatten)]
        exec: ExecArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Send a single operation or request.
    Try {
        path: PathBuf,
        #[arg(long, conflicts_with = "request", required_unless_present = "request")]
        operation: Option<String>,
        #[arg(long)]
        request: Option<String>,
        #[command(flatten)]
        env: EnvArgs,
        #[command(flatten)]
        transport: TransportArgs,
        #[command(flatten)]
        exec: ExecArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
