//! Command dispatch: bridges CLI args -> orchestration -> output formatting.

pub mod config_cmd;
pub mod deploy;
pub mod preview;
pub mod reconcile;
pub mod sites;
pub mod state;
pub mod util;

use std::path::PathBuf;

use airdeploy_api::ControlPlaneClient;
use airdeploy_core::JsonFileAssignmentStore;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Everything a controller-bound command needs.
pub struct Context {
    pub client: ControlPlaneClient,
    pub batch_size: usize,
    pub state_path: PathBuf,
}

impl Context {
    pub async fn open_store(&self) -> Result<JsonFileAssignmentStore, CliError> {
        Ok(JsonFileAssignmentStore::open(self.state_path.clone()).await?)
    }
}

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Deploy(args) => deploy::handle(ctx, args, global).await,
        Command::Preview(args) => preview::handle(ctx, args, global).await,
        Command::Reconcile(args) => reconcile::handle(ctx, args, global).await,
        Command::Sites => sites::handle(ctx, global).await,
        // Handled before a controller connection is built
        Command::State(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
