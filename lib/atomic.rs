use crate::chess::{MoveResult, Position, Role, Square};
use arrayvec::ArrayVec;
use derive_more::{Deref, IntoIterator};
use tracing::instrument;

/// The [`Square`]s cleared by a capture in [Atomic chess].
///
/// The capture square always comes first, followed by its neighbors row by row.
///
/// [Atomic chess]: https://en.wikipedia.org/wiki/Atomic_chess
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deref, IntoIterator)]
pub struct Explosion(#[into_iterator(owned, ref)] ArrayVec<Square, 9>);

impl Explosion {
    /// Computes the squares caught in the explosion caused by a capture.
    ///
    /// Pawns are immune to the blast unless captured directly.
    pub fn resolve(pos: &Position, result: &MoveResult) -> Self {
        debug_assert!(result.is_capture(), "`{}` is not a capture", result);

        let center = result.whither();
        let mut squares = ArrayVec::new();
        squares.push(center);

        squares.extend(center.neighbors().filter(|&s| match pos.piece_at(s) {
            Some(p) => p.role() != Role::Pawn,
            None => false,
        }));

        Explosion(squares)
    }

    /// Takes every piece caught in this explosion off the board.
    pub fn detonate(&self, pos: &mut Position) {
        for &s in self.iter() {
            pos.remove(s);
        }
    }

    /// The capture square.
    pub fn center(&self) -> Square {
        self[0]
    }
}

/// Resolves the explosion caused by a capture and clears the affected squares.
#[instrument(level = "trace", skip(pos, result), fields(%pos, %result), ret)]
pub fn explode(pos: &mut Position, result: &MoveResult) -> Explosion {
    let explosion = Explosion::resolve(pos, result);
    explosion.detonate(pos);
    explosion
}
