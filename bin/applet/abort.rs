use crate::remote::Remote;
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::lichess::Service;
use lib::session::{GameId, Session};
use tracing::{info, instrument};

/// Aborts a game that has barely started.
#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Abort {
    /// The game identifier.
    id: GameId,
}

impl Abort {
    #[instrument(level = "trace", skip(self, remote), err)]
    pub async fn execute(self, remote: Remote) -> Result<(), Anyhow> {
        let session = Session::new(self.id, remote.token().await?);
        remote.service().abort(&session).await.context("failed to abort")?;
        info!(id = %session.id(), "aborted");
        Ok(())
    }
}
