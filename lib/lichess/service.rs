use super::{Challenge, Event};
use crate::chess::Move;
use crate::session::{GameId, Session, Token};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use futures_util::stream::BoxStream;

/// The reason why a request to the game server failed.
#[derive(Debug, Display, Error, From)]
pub enum ServiceError {
    #[display(fmt = "{}", _0)]
    Transport(reqwest::Error),

    #[display(fmt = "HTTP error! status: {}, message: {}", _0, _1)]
    #[from(ignore)]
    Status(u16, String),

    #[display(fmt = "failed to decode message: {}", _0)]
    Decode(serde_json::Error),
}

impl ServiceError {
    /// Whether this error affects a single message rather than the connection.
    pub fn is_decode(&self) -> bool {
        matches!(self, ServiceError::Decode(_))
    }
}

/// Trait for remote game servers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Service {
    /// Challenges the computer to a game, returning the new game's identifier.
    async fn challenge(&self, token: &Token, challenge: &Challenge) -> Result<GameId, ServiceError>;

    /// Submits a [`Move`] in coordinate notation.
    async fn submit(&self, session: &Session, m: Move) -> Result<(), ServiceError>;

    /// Streams the game's [`Event`]s.
    fn stream(&self, session: &Session) -> BoxStream<'static, Result<Event, ServiceError>>;

    /// Resigns the game.
    async fn resign(&self, session: &Session) -> Result<(), ServiceError>;

    /// Aborts a game that has barely started.
    async fn abort(&self, session: &Session) -> Result<(), ServiceError>;
}
