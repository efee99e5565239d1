//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod attacks;
pub mod config_cmd;
pub mod servers;
pub mod stats;
pub mod watch;

use fleetsync_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a panel-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Servers(args) => servers::handle(session, args, global).await,
        Command::Attacks(args) => attacks::handle(session, args, global).await,
        Command::Stats => stats::handle(session, global).await,
        Command::Watch(args) => watch::handle(session, args, global).await,
        // Config is handled before a session exists
        Command::Config(args) => config_cmd::handle(args, global),
    }
}
