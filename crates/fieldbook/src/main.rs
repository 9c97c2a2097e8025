mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FIELDBOOK_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands work without a server
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fieldbook", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let (profile, workspace) = config::build_workspace(&cli.global)?;
            let workspace = Arc::new(workspace);
            let mut failures = workspace.auth_failures();
            let watcher = Arc::clone(&workspace);
            let listener = tokio::spawn(async move {
                while let Ok(failure) = failures.recv().await {
                    watcher.apply_auth_failure(&failure);
                }
            });

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = tokio::select! {
                result = commands::dispatch(cmd, &workspace, &profile, &cli.global) => result,
                _ = tokio::signal::ctrl_c() => {
                    let cancelled = workspace.cancel_all();
                    tracing::debug!(cancelled, "interrupted");
                    Err(CliError::Interrupted)
                }
            };
            listener.abort();

            match result {
                Err(CliError::AuthFailed { .. }) => Err(CliError::AuthFailed { profile }),
                other => other,
            }
        }
    }
}
