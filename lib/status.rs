use crate::chess::{Color, Move};
use crate::lichess::{GameStatus, Level};
use crate::session::GameId;
use derive_more::{Display, From};

/// How a game stands, as told by the game server.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Report {
    #[display(fmt = "Checkmate! Game Over")]
    Checkmate,

    #[display(fmt = "Stalemate! Game Over")]
    Stalemate,

    #[display(fmt = "Game Draw!")]
    Draw,

    #[display(fmt = "{} wins by resignation", "_0.name()")]
    Resignation(Color),

    #[display(fmt = "Game aborted")]
    Aborted,

    #[display(fmt = "Game Over! {} wins!", "_0.name()")]
    Victory(Color),

    #[display(fmt = "Game Over!")]
    Over,

    #[display(fmt = "{} to move", "_0.name()")]
    Turn(Color),
}

impl Report {
    /// Classifies the state of a game after a number of plies.
    pub fn classify(status: GameStatus, winner: Option<Color>, plies: usize) -> Self {
        use GameStatus::*;

        match (status, winner) {
            (Mate, _) => Report::Checkmate,
            (Stalemate, _) => Report::Stalemate,
            (Draw, _) => Report::Draw,
            (Resign, Some(c)) => Report::Resignation(c),
            (Aborted | NoStart, _) => Report::Aborted,
            (_, Some(c)) => Report::Victory(c),
            (s, None) if !s.is_ongoing() && s != Unknown => Report::Over,
            (_, None) if plies % 2 == 0 => Report::Turn(Color::White),
            (_, None) => Report::Turn(Color::Black),
        }
    }

    /// Whether the game is over.
    pub fn is_final(&self) -> bool {
        !matches!(self, Report::Turn(_))
    }
}

/// What the player is told about the game.
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash, From)]
pub enum Status {
    #[display(fmt = "")]
    #[from(ignore)]
    Idle,

    #[display(fmt = "{}", _0)]
    Report(Report),

    #[display(fmt = "Game started against Stockfish (Level {})! ID: {}", _1, _0)]
    #[from(ignore)]
    Started(GameId, Level),

    #[display(fmt = "Watching game {}", _0)]
    #[from(ignore)]
    Watching(GameId),

    #[display(fmt = "Move made: {}", _0)]
    #[from(ignore)]
    Sent(Move),

    #[display(fmt = "Error creating game: {}", _0)]
    #[from(ignore)]
    Unstarted(String),

    #[display(fmt = "Error making move: {}", _0)]
    #[from(ignore)]
    Failed(String),

    #[display(fmt = "Error replaying game: {}", _0)]
    #[from(ignore)]
    Desync(String),

    #[display(fmt = "Error streaming game: {}", _0)]
    #[from(ignore)]
    Disconnected(String),

    #[display(fmt = "Game forfeited")]
    #[from(ignore)]
    Forfeited,
}

impl Default for Status {
    fn default() -> Self {
        Status::Idle
    }
}
