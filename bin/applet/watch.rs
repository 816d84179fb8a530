use crate::remote::Remote;
use crate::terminal::Terminal;
use anyhow::Error as Anyhow;
use clap::Parser;
use futures_util::stream;
use lib::{game::Game, session::GameId, session::Session, status::Status};
use std::io::stdout;
use tracing::instrument;

/// Follows a game in progress without playing.
#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Watch {
    /// The game identifier.
    id: GameId,
}

impl Watch {
    #[instrument(level = "trace", skip(self, remote), err)]
    pub async fn execute(self, remote: Remote) -> Result<(), Anyhow> {
        let token = remote.token().await?;
        let mut view = Terminal::new(stdout());
        let mut reconciler = remote.reconciler();
        reconciler.set_status(Status::Watching(self.id.clone()), &mut view);

        let session = Session::new(self.id, token);
        let mut game = Game::attach(remote.service(), session, reconciler, None, view);
        game.run(stream::empty()).await;
        Ok(())
    }
}
