use derive_more::{DebugCustom, Display, Error, From};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::{convert::Infallible, fs, io, path::Path, str::FromStr, sync::Arc};
use tracing::instrument;

/// The identifier of a game on the game server.
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GameId(String);

impl FromStr for GameId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(GameId(s.trim().into()))
    }
}

/// A personal API access token.
#[derive(DebugCustom, Clone, Eq, PartialEq)]
#[debug(fmt = "Token(..)")]
pub struct Token(String);

/// The reason why a [`Token`] is unavailable.
#[derive(Debug, Display, Error, From)]
pub enum TokenError {
    #[display(fmt = "no API token available")]
    Missing,
    #[display(fmt = "failed to access the token file")]
    Io(io::Error),
}

impl Token {
    /// The secret, as sent in the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Reads a token previously stored in a file.
    #[instrument(level = "trace", err)]
    pub fn load(path: &Path) -> Result<Self, TokenError> {
        match fs::read_to_string(path) {
            Ok(s) => s.parse(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TokenError::Missing),
            Err(e) => Err(e.into()),
        }
    }

    /// Stores this token in a file so later runs need not ask for it.
    #[instrument(level = "trace", err)]
    pub fn store(&self, path: &Path) -> Result<(), TokenError> {
        Ok(fs::write(path, &self.0)?)
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(TokenError::Missing),
            s => Ok(Token(s.into())),
        }
    }
}

/// A game in progress on the game server.
///
/// Clones share the same liveness, so closing any of them ends the game for all.
#[derive(Debug, Clone)]
pub struct Session {
    id: GameId,
    token: Token,
    active: Arc<AtomicBool>,
}

impl Session {
    /// Opens a session for the game identified by `id`.
    pub fn new(id: GameId, token: Token) -> Self {
        Session {
            id,
            token,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The game identifier.
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// The credential used for every request in this game.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Whether the game is still being played.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Ends the session.
    ///
    /// Returns `true` if the session was closed for the first time.
    pub fn close(&self) -> bool {
        self.active.fetch_and(false, Ordering::Relaxed)
    }
}
