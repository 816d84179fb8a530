use crate::chess::{Position, Square};
use crate::status::Status;
use std::time::Duration;

/// Trait for types that present the game to the player.
#[cfg_attr(test, mockall::automock)]
pub trait View {
    /// Draws every piece in a [`Position`].
    fn redraw(&mut self, pos: &Position);

    /// Marks or unmarks a selected [`Square`].
    fn highlight(&mut self, s: Square, on: bool);

    /// Plays the explosion effect centered at a [`Square`] for a while.
    fn explode(&mut self, s: Square, duration: Duration);

    /// Shows the status of the game.
    fn status(&mut self, status: &Status);
}
