use crate::chess::{Promotion, Square};
use derive_more::{DebugCustom, Display, Error};
use shakmaty as sm;
use std::str::FromStr;

/// A chess move in [pure coordinate notation].
///
/// [pure coordinate notation]: https://www.chessprogramming.org/Algebraic_Chess_Notation#Pure_coordinate_notation
#[derive(DebugCustom, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[cfg_attr(test, filter(#self.0 != #self.1))]
#[debug(fmt = "Move({})", self)]
#[display(fmt = "{}{}{}", _0, _1, _2)]
pub struct Move(pub Square, pub Square, pub Promotion);

impl Move {
    /// The source [`Square`].
    pub fn whence(&self) -> Square {
        self.0
    }

    /// The destination [`Square`].
    pub fn whither(&self) -> Square {
        self.1
    }

    /// The [`Promotion`] specifier.
    pub fn promotion(&self) -> Promotion {
        self.2
    }
}

/// The reason why the string is not a valid move.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "expected a move in coordinate notation, e.g. `e2e4` or `e7e8q`")]
pub struct ParseMoveError;

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let whence = s.get(..2).ok_or(ParseMoveError)?;
        let whither = s.get(2..4).ok_or(ParseMoveError)?;
        let promotion = s.get(4..).ok_or(ParseMoveError)?;

        Ok(Move(
            whence.parse().map_err(|_| ParseMoveError)?,
            whither.parse().map_err(|_| ParseMoveError)?,
            promotion.parse().map_err(|_| ParseMoveError)?,
        ))
    }
}

#[doc(hidden)]
impl From<Move> for sm::uci::Uci {
    fn from(m: Move) -> Self {
        sm::uci::Uci::Normal {
            from: m.whence().into(),
            to: m.whither().into(),
            promotion: m.promotion().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn parsing_printed_move_is_an_identity(m: Move) {
        assert_eq!(m.to_string().parse(), Ok(m));
    }

    #[proptest]
    fn parsing_move_fails_for_truncated_input(m: Move, #[strategy(0usize..4)] n: usize) {
        assert_eq!(m.to_string()[..n].parse::<Move>(), Err(ParseMoveError));
    }

    #[test]
    fn move_is_printed_in_coordinate_notation() {
        let e2: Square = "e2".parse().unwrap();
        let e4: Square = "e4".parse().unwrap();
        let e8: Square = "e8".parse().unwrap();
        assert_eq!(Move(e2, e4, Promotion::None).to_string(), "e2e4");
        assert_eq!(Move(e2, e8, Promotion::Queen).to_string(), "e2e8q");
    }

    #[proptest]
    fn move_has_an_equivalent_shakmaty_representation(m: Move) {
        assert_eq!(sm::uci::Uci::from(m).to_string(), m.to_string());
    }
}
