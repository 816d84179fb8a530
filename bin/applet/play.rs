use crate::remote::Remote;
use crate::terminal::{commands, Terminal};
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::{game::Game, lichess::Challenge};
use std::io::stdout;
use tokio::io::stdin;
use tracing::instrument;

/// Plays a game of Atomic chess against the computer.
///
/// Pick a square then another to move, or type moves in coordinate notation.
#[derive(Debug, Default, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Play {
    /// The challenge configuration.
    #[clap(short, long, default_value_t)]
    challenge: Challenge,
}

impl Play {
    #[instrument(level = "trace", skip(self, remote), err)]
    pub async fn execute(self, remote: Remote) -> Result<(), Anyhow> {
        let token = remote.token().await?;
        let view = Terminal::new(stdout());

        let mut game = Game::start(
            remote.service(),
            token,
            &self.challenge,
            remote.reconciler(),
            view,
        )
        .await
        .context("failed to create the game")?;

        game.run(commands(stdin())).await;
        Ok(())
    }
}
