mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleetsync_core::Session;

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
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;

    match command {
        // Config commands don't need a panel
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        cmd => {
            let session_config = config::build_session_config(&global)?;
            tracing::debug!(command = ?cmd, "dispatching command");

            // Only watch follows the event channel; everything else is a
            // single request-response cycle.
            if matches!(cmd, Command::Watch(_)) {
                let session = Session::new(session_config)?;
                let result = commands::dispatch(cmd, &session, &global).await;
                session.shutdown().await;
                result
            } else {
                Session::oneshot(session_config, |session| async move {
                    commands::dispatch(cmd, &session, &global).await
                })
                .await
            }
        }
    }
}
