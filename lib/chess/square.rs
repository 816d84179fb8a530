use derive_more::{DebugCustom, Display, Error};
use shakmaty as sm;
use std::{convert::TryFrom, str::FromStr};

#[cfg(test)]
use proptest::prelude::*;

/// A square on the chess board.
///
/// Squares are addressed either in algebraic notation or by a pair of
/// `(row, col)` coordinates, where row 0 is the eighth rank and column 0 is the a-file.
#[derive(DebugCustom, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[debug(fmt = "{}", self)]
#[display(fmt = "{}{}", "_0.file().char()", "_0.rank().char()")]
pub struct Square(#[cfg_attr(test, strategy((0u32..64).prop_map(sm::Square::new)))] sm::Square);

impl Square {
    /// This square's row, counting from the eighth rank.
    pub fn row(&self) -> u8 {
        7 - u8::from(self.0.rank())
    }

    /// This square's column, counting from the a-file.
    pub fn col(&self) -> u8 {
        u8::from(self.0.file())
    }

    /// Returns an iterator over all [`Square`]s, row by row from a8 to h1.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square::at(row, col)))
    }

    /// The in-bounds squares surrounding this one, row by row.
    pub fn neighbors(&self) -> impl Iterator<Item = Self> {
        let (row, col) = (self.row() as i8, self.col() as i8);
        (-1..=1i8)
            .flat_map(move |dr| (-1..=1i8).map(move |dc| (dr, dc)))
            .filter(|&offset| offset != (0, 0))
            .filter_map(move |(dr, dc)| {
                let coords = (u8::try_from(row + dr).ok()?, u8::try_from(col + dc).ok()?);
                Square::try_from(coords).ok()
            })
    }

    fn at(row: u8, col: u8) -> Self {
        let file = sm::File::new(u32::from(col));
        let rank = sm::Rank::new(u32::from(7 - row));
        Square(sm::Square::from_coords(file, rank))
    }
}

/// The reason why converting [`Square`] from coordinates failed.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display(fmt = "expected coordinates in the range `(0..=7, 0..=7)`")]
pub struct SquareOutOfRange;

impl TryFrom<(u8, u8)> for Square {
    type Error = SquareOutOfRange;

    fn try_from((row, col): (u8, u8)) -> Result<Self, Self::Error> {
        if row < 8 && col < 8 {
            Ok(Square::at(row, col))
        } else {
            Err(SquareOutOfRange)
        }
    }
}

impl From<Square> for (u8, u8) {
    fn from(s: Square) -> Self {
        (s.row(), s.col())
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
pub enum ParseSquareError {
    #[display(fmt = "expected lower case letter in the range `('a'..='h')`")]
    InvalidFile,
    #[display(fmt = "expected digit in the range `('1'..='8')`")]
    InvalidRank,
}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();

        let file = chars
            .next()
            .and_then(sm::File::from_char)
            .ok_or(ParseSquareError::InvalidFile)?;

        let rank = match (chars.next(), chars.next()) {
            (Some(c), None) => sm::Rank::from_char(c).ok_or(ParseSquareError::InvalidRank)?,
            _ => return Err(ParseSquareError::InvalidRank),
        };

        Ok(Square(sm::Square::from_coords(file, rank)))
    }
}

#[doc(hidden)]
impl From<sm::Square> for Square {
    fn from(s: sm::Square) -> Self {
        Square(s)
    }
}

#[doc(hidden)]
impl From<Square> for sm::Square {
    fn from(s: Square) -> Self {
        s.0
    }
}
