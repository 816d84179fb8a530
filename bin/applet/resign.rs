use crate::remote::Remote;
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::lichess::Service;
use lib::session::{GameId, Session};
use tracing::{info, instrument};

/// Resigns a game in progress.
#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Resign {
    /// The game identifier.
    id: GameId,
}

impl Resign {
    #[instrument(level = "trace", skip(self, remote), err)]
    pub async fn execute(self, remote: Remote) -> Result<(), Anyhow> {
        let session = Session::new(self.id, remote.token().await?);
        remote.service().resign(&session).await.context("failed to resign")?;
        info!(id = %session.id(), "resigned");
        Ok(())
    }
}
