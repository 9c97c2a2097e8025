//! Command dispatch: bridges CLI args -> workspace stores -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod labels;
pub mod merchants;
pub mod projects;
pub mod tags;
pub mod tasks;
pub mod util;

use fieldbook_core::Workspace;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    workspace: &Workspace,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(workspace, profile, args, global).await,
        Command::Logout => auth::logout(workspace, global),
        Command::Whoami => auth::whoami(workspace, profile, global).await,
        Command::Info => auth::info(workspace, global).await,
        cmd => {
            util::require_login(workspace, profile)?;
            match cmd {
                Command::Projects(args) => projects::handle(workspace, args, global).await,
                Command::Tasks(args) => tasks::handle(workspace, args, global).await,
                Command::Labels(args) => labels::handle_labels(workspace, args, global).await,
                Command::Teams(args) => labels::handle_teams(workspace, args, global).await,
                Command::Merchants(args) => merchants::handle(workspace, args, global).await,
                Command::Tags(args) => tags::handle(workspace, args, global).await,
                Command::Login(_)
                | Command::Logout
                | Command::Whoami
                | Command::Info
                | Command::Config(_)
                | Command::Completions(_) => Err(CliError::Internal(format!(
                    "command {cmd:?} is not dispatched here"
                ))),
            }
        }
    }
}
