use crate::chess::Position;
use derive_more::{DebugCustom, Display, Error};
use shakmaty as sm;
use std::str::FromStr;

/// A representation of the [Forsyth–Edwards Notation].
///
/// [Forsyth–Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
#[derive(DebugCustom, Display, Clone, Eq, PartialEq)]
#[debug(fmt = "Fen(\"{}\")", self)]
#[display(fmt = "{}", _0)]
pub struct Fen(sm::fen::Fen);

impl Default for Fen {
    fn default() -> Self {
        Position::default().into()
    }
}

/// The reason why the string is not valid FEN.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "failed to parse FEN")]
pub struct ParseFenError;

impl FromStr for Fen {
    type Err = ParseFenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Fen(s.trim().parse().map_err(|_| ParseFenError)?))
    }
}

impl From<Position> for Fen {
    fn from(pos: Position) -> Self {
        sm::Setup::from(pos).into()
    }
}

#[doc(hidden)]
impl From<sm::Setup> for Fen {
    fn from(setup: sm::Setup) -> Self {
        Fen(sm::fen::Fen(setup))
    }
}

#[doc(hidden)]
impl From<Fen> for sm::Setup {
    fn from(fen: Fen) -> Self {
        fen.0 .0
    }
}
