//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod records;
pub mod sync;
pub mod util;
pub mod watch;

use vendra_core::SyncConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: SyncConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Sync => sync::handle(config, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::List(args) => records::list(config, args, global).await,
        Command::Create(args) => records::create(config, args, global).await,
        Command::Update(args) => records::update(config, args, global).await,
        Command::Delete(args) => records::delete(config, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before connecting".into(),
        )),
    }
}
