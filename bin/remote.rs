use anyhow::{Context, Error as Anyhow};
use clap::Args;
use humantime_serde::re::humantime::parse_duration;
use lib::lichess::{Lichess, LICHESS};
use lib::reconcile::Reconciler;
use lib::session::{Token, TokenError};
use std::{io::Write, path::PathBuf, time::Duration};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::{info, instrument};

/// How to reach the game server.
#[derive(Debug, Args)]
pub struct Remote {
    /// The address of the game server.
    #[clap(long, default_value = LICHESS)]
    server: String,

    /// A personal API access token.
    #[clap(long, env = "LICHESS_TOKEN", hide_env_values = true)]
    token: Option<Token>,

    /// Where the API access token is kept between runs.
    #[clap(long, default_value = ".lichess-token")]
    token_file: PathBuf,

    /// How long explosions take to settle.
    #[clap(long, default_value = "500ms", value_parser = parse_duration)]
    settle: Duration,
}

impl Remote {
    /// A client for the game server.
    pub fn service(&self) -> Lichess {
        Lichess::new(&self.server)
    }

    /// A fresh [`Reconciler`].
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.settle)
    }

    /// The API access token, asking the user for one if none is available.
    #[instrument(level = "trace", skip(self), err)]
    pub async fn token(&self) -> Result<Token, Anyhow> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        match Token::load(&self.token_file) {
            Ok(token) => Ok(token),
            Err(TokenError::Missing) => {
                let token = prompt().await?;
                token.store(&self.token_file).with_context(|| {
                    format!("failed to store the token in `{}`", self.token_file.display())
                })?;

                info!(path = %self.token_file.display(), "token stored");
                Ok(token)
            }

            Err(e) => Err(e).context("failed to load the token"),
        }
    }
}

async fn prompt() -> Result<Token, Anyhow> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Lichess API token: ")?;
    stderr.flush()?;

    let mut lines = BufReader::new(stdin()).lines();
    let line = lines.next_line().await?.unwrap_or_default();
    Ok(line.parse()?)
}
