//! `dolt-hook` command line: wraps a command between the hook's run start
//! and run end calls, or runs a single bookkeeping operation.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dolt_hook::commit::CommitController;
use dolt_hook::infrastructure::{config::Settings, telemetry::TelemetryBuilder};
use dolt_hook::{DoltHook, RunParams};
use tracing::{error, info};

/// Exit code reported when the wrapped command could not be started.
const SPAWN_FAILURE_EXIT: u8 = 127;

#[derive(Debug, Parser)]
#[command(name = "dolt-hook", version, about = "Branch and commit a Dolt database around a run")]
struct Cli {
    /// Settings file (TOML). Defaults to ./dolt-hook.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a command on a branch, then commit its changes and restore the branch.
    Run {
        /// Branch the run works on; created if missing.
        #[arg(long)]
        branch: Option<String>,
        /// Run identifier used in the commit message (default: random UUID).
        #[arg(long)]
        run_id: Option<String>,
        /// Command to run, after `--`.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Print the active branch.
    ActiveBranch,
    /// Commit pending changes with the message for the given run.
    Commit {
        /// Run identifier used in the commit message.
        #[arg(long)]
        run_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _telemetry =
        TelemetryBuilder::from_settings(&settings.telemetry, env!("CARGO_PKG_VERSION"))
            .init()
            .context("Failed to initialize telemetry")?;

    info!(
        target_db = %settings.database.connection_options().target(),
        "Dolt hook starting"
    );
    let mut hook = DoltHook::from_settings(&settings);

    match cli.command {
        Command::Run {
            branch,
            run_id,
            command,
        } => {
            let run_id = run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let params = match branch {
                Some(branch) => RunParams::new(run_id).with_branch(branch),
                None => RunParams::new(run_id),
            };
            Ok(wrap(&mut hook, &params, &command).await)
        }
        Command::ActiveBranch => {
            let Some(branch) = hook
                .branches()
                .active_branch()
                .await
                .context("Failed to read the active branch")?
            else {
                bail!("The database reports no active branch");
            };
            println!("{branch}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Commit { run_id } => {
            let message = CommitController::commit_message(&RunParams::new(run_id));
            match hook
                .commits()
                .commit(&message)
                .await
                .context("Failed to commit")?
            {
                Some(commit) => println!("{commit}"),
                None => info!("Nothing to commit"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Runs `command` between `before_run` and `after_run`.
///
/// The run end is handled whatever the command's outcome; the exit code is
/// the command's own.
async fn wrap(hook: &mut DoltHook, params: &RunParams, command: &[String]) -> ExitCode {
    let Some((program, args)) = command.split_first() else {
        error!("No command given");
        return ExitCode::from(SPAWN_FAILURE_EXIT);
    };

    hook.before_run(params).await;
    info!(run_id = params.run_id(), "Running {program}");
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await;

    if let Some(commit) = hook.after_run(params).await {
        println!("{commit}");
    }

    match status {
        Ok(status) => {
            let code = status.code().unwrap_or(1);
            info!(run_id = params.run_id(), code, "Run finished");
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
        Err(e) => {
            error!("Failed to start {program}: {e}");
            ExitCode::from(SPAWN_FAILURE_EXIT)
        }
    }
}
