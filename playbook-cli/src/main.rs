use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod logging;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "playbook", version, about = "API test playbook runner")]
struct Cli {
    /// Log filter for diagnostics on stderr (e.g. `debug`, `playbook_exec=trace`).
    /// Falls back to RUST_LOG, then `warn`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_level.as_deref()) {
        eprintln!("error: {e}");
        std::process::exit(exit_codes::RUNTIME_ERROR);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Validate { path, output } => cmd::validate::validate_cmd(&path, output).await,
        Command::Operations { path, output } => {
            cmd::operations::operations_cmd(&path, output).await
        }
        Command::Run {
            path,
            operation,
            scenario,
            env,
            transport,
            exec,
            output,
        } => {
            cmd::run::run_cmd(
                &path,
                &operation,
                scenario.as_deref(),
                env,
                transport,
                exec,
                output,
            )
            .await
        }
        Command::Try {
            path,
            operation,
            request,
            env,
            transport,
            exec,
            output,
        } => {
            cmd::try_request::try_cmd(
                &path,
                operation.as_deref(),
                request.as_deref(),
                env,
                transport,
                exec,
                output,
            )
            .await
        }
    }
}
